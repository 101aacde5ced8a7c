use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use klari::{
    auth::dto::RegisterForm,
    catalog::{Category, Goal, SkinType, StepKind},
    products::{ListFilter, ProductDetail, ProductList},
    routines::{dto::RoutineType, HomeOverview, PickerTab, ProductPicker, RoutineScreen, ScreenState, Step},
    users::{
        dto::{Membership, User},
        profile::{choose_goals, choose_skin_type, ProfileEditor},
    },
    AppState,
};

/// Klari skincare client
#[derive(Parser)]
#[command(name = "klari")]
#[command(about = "Klari skincare client: products, favorites and routines")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "KLARI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and start onboarding
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "KLARI_PASSWORD", hide_env_values = true)]
        password: String,
        /// Defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed in user
    Whoami,
    /// Both active routines
    Home,
    /// List products
    Products {
        /// Category, e.g. serums or "Protectores solares"
        #[arg(short, long)]
        category: Option<Category>,
        /// Text matched against name and brand
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long, conflicts_with = "inventory")]
        favorites: bool,
        #[arg(long)]
        inventory: bool,
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show one product
    Product { id: i64 },
    /// Toggle a product in the favorites
    Favorite { id: i64 },
    /// Toggle a product in the owned products
    Own { id: i64 },
    /// Set the skin type (NORMAL, SECA, GRASA, MIXTA, SENSIBLE)
    SkinType { skin_type: SkinType },
    /// Set the onboarding goals
    Goals {
        #[arg(required = true)]
        goals: Vec<Goal>,
    },
    /// Show or edit the profile
    Profile {
        #[arg(long)]
        skin_type: Option<SkinType>,
        #[arg(long = "add-goal")]
        add: Vec<Goal>,
        #[arg(long = "remove-goal")]
        remove: Vec<Goal>,
    },
    /// Day and night routines
    Routine {
        #[command(subcommand)]
        action: RoutineAction,
    },
}

#[derive(Subcommand)]
pub enum RoutineAction {
    /// Show the active routine
    Show { kind: RoutineType },
    /// Create the starter routine
    Init { kind: RoutineType },
    /// List candidate products for a step
    Suggest {
        kind: RoutineType,
        step: StepKind,
        #[arg(long, value_enum, default_value_t = Tab::Suggestions)]
        tab: Tab,
    },
    /// Put a product on a step, adding the step if needed
    Add {
        kind: RoutineType,
        step: StepKind,
        product_id: i64,
    },
    /// Remove a step and its product
    Remove { kind: RoutineType, step: StepKind },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Tab {
    Suggestions,
    Favorites,
    Inventory,
}

impl From<Tab> for PickerTab {
    fn from(tab: Tab) -> Self {
        match tab {
            Tab::Suggestions => PickerTab::Suggestions,
            Tab::Favorites => PickerTab::Favorites,
            Tab::Inventory => PickerTab::Inventory,
        }
    }
}

impl Command {
    pub async fn run(self, app: &AppState) -> anyhow::Result<()> {
        match self {
            Command::Login { email, password } => {
                let user = app.auth.login(&email, &password).await?;
                println!("Signed in as {} <{}>", user.username, user.email);
            }
            Command::Register {
                username,
                email,
                confirm_password,
                password,
            } => {
                let form = RegisterForm {
                    username,
                    email,
                    confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                    password,
                };
                let user = app.auth.register_form(&form).await?;
                println!("Welcome {}! Next: klari skin-type <type>", user.username);
            }
            Command::Logout => {
                app.auth.logout().await;
                println!("Signed out");
            }
            Command::Whoami => {
                let user = app.session.require_user().await?;
                print_user(&user);
            }
            Command::Home => {
                let overview = HomeOverview::load(app).await?;
                for (kind, routine) in [
                    (RoutineType::Day, overview.day),
                    (RoutineType::Night, overview.night),
                ] {
                    match routine {
                        Some(r) => println!("{}: {} products", kind.title(), r.products.len()),
                        None => println!("{}: not created", kind.title()),
                    }
                }
            }
            Command::Products {
                category,
                search,
                favorites,
                inventory,
                pages,
            } => {
                let restriction = if favorites {
                    Some(Membership::Favorites)
                } else if inventory {
                    Some(Membership::Inventory)
                } else {
                    None
                };
                let list = ProductList::with_filter(
                    app,
                    ListFilter {
                        category,
                        query: search.unwrap_or_default().trim().to_string(),
                        restriction,
                    },
                );
                list.load_memberships().await?;
                list.refresh().await?;
                for _ in 1..pages {
                    if !list.load_more().await? {
                        break;
                    }
                }
                let snapshot = list.snapshot().await;
                if snapshot.items.is_empty() {
                    println!("No products found");
                }
                for p in &snapshot.items {
                    let fav = list.is_member(Membership::Favorites, p.id).await;
                    let owned = list.is_member(Membership::Inventory, p.id).await;
                    println!(
                        "{:>5}  {}{}  {} ({})",
                        p.id,
                        if fav { "*" } else { " " },
                        if owned { "+" } else { " " },
                        p.name,
                        p.brand
                    );
                }
                if snapshot.has_more {
                    println!("(more available, use --pages)");
                }
            }
            Command::Product { id } => {
                let detail = ProductDetail::load(app, id).await?;
                let p = &detail.product;
                println!("{} by {}", p.name, p.brand);
                match p.category.parse::<Category>() {
                    Ok(c) => println!("Category: {}", c.label()),
                    Err(_) => println!("Category: {}", p.category),
                }
                if !p.application_time.is_empty() {
                    println!("Use: {}", p.application_time);
                }
                if !p.description.is_empty() {
                    println!("\n{}\n", p.description);
                }
                if !p.ingredients.is_empty() {
                    println!("Ingredients: {}", p.ingredients.join(", "));
                }
                println!(
                    "Favorite: {}  Owned: {}",
                    yes_no(detail.favorite),
                    yes_no(detail.owned)
                );
            }
            Command::Favorite { id } => toggle(app, id, Membership::Favorites).await?,
            Command::Own { id } => toggle(app, id, Membership::Inventory).await?,
            Command::SkinType { skin_type } => {
                choose_skin_type(app, skin_type).await?;
                println!("Skin type saved. Next: klari goals <goal>...");
            }
            Command::Goals { goals } => {
                let user = choose_goals(app, &goals).await?;
                println!("{} goals saved", user.goals.len());
            }
            Command::Profile {
                skin_type,
                add,
                remove,
            } => {
                let mut editor = ProfileEditor::load(app).await?;
                if skin_type.is_some() || !add.is_empty() || !remove.is_empty() {
                    let draft = editor.begin_edit();
                    if skin_type.is_some() {
                        draft.skin_type = skin_type;
                    }
                    draft.goals.extend(add);
                    for g in &remove {
                        draft.goals.remove(g);
                    }
                    editor.save().await?;
                }
                print_user(editor.profile());
            }
            Command::Routine { action } => action.run(app).await?,
        }
        Ok(())
    }
}

impl RoutineAction {
    async fn run(self, app: &AppState) -> anyhow::Result<()> {
        match self {
            RoutineAction::Show { kind } => {
                let mut screen = RoutineScreen::new(app, kind);
                screen.load().await?;
                print_routine(&screen);
            }
            RoutineAction::Init { kind } => {
                let mut screen = RoutineScreen::new(app, kind);
                screen.load().await?;
                screen.create_initial().await?;
                print_routine(&screen);
            }
            RoutineAction::Suggest { kind, step, tab } => {
                let mut picker = ProductPicker::new(app, kind, step);
                picker.select_tab(tab.into()).await?;
                for p in picker.items(tab.into()) {
                    println!("{:>5}  {} ({})", p.id, p.name, p.brand);
                }
            }
            RoutineAction::Add {
                kind,
                step,
                product_id,
            } => {
                let mut screen = loaded_screen(app, kind).await?;
                let mut editor = screen.edit()?;
                if editor.step(step).is_none() {
                    editor.add_step(step)?;
                }
                editor.assign_product(step, product_id).await?;
                screen.finish_edit(editor).await?;
                print_routine(&screen);
            }
            RoutineAction::Remove { kind, step } => {
                let mut screen = loaded_screen(app, kind).await?;
                let mut editor = screen.edit()?;
                editor.remove_step(step).await?;
                screen.finish_edit(editor).await?;
                print_routine(&screen);
            }
        }
        Ok(())
    }
}

async fn loaded_screen(app: &AppState, kind: RoutineType) -> anyhow::Result<RoutineScreen> {
    let mut screen = RoutineScreen::new(app, kind);
    screen.load().await?;
    if *screen.state() == ScreenState::Empty {
        anyhow::bail!("no active {kind} routine; run `klari routine init {kind}` first");
    }
    Ok(screen)
}

async fn toggle(app: &AppState, id: i64, kind: Membership) -> anyhow::Result<()> {
    let mut detail = ProductDetail::load(app, id)
        .await
        .with_context(|| format!("product {id}"))?;
    let member = detail.toggle(kind).await?;
    let list = match kind {
        Membership::Favorites => "favorites",
        Membership::Inventory => "my products",
    };
    if member {
        println!("Added {} to {list}", detail.product.name);
    } else {
        println!("Removed {} from {list}", detail.product.name);
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("{} <{}>", user.username, user.email);
    match user.skin_type {
        Some(s) => println!("Skin type: {s}"),
        None => println!("Skin type: not set"),
    }
    if !user.goals.is_empty() {
        println!("Goals:");
        for g in &user.goals {
            println!("  - {}", g.description());
        }
    }
}

fn print_routine(screen: &RoutineScreen) {
    let kind = screen.routine_type();
    match screen.state() {
        ScreenState::Empty => {
            println!("No active {kind} routine. Create one with `klari routine init {kind}`.");
        }
        ScreenState::Failed(message) => println!("Could not load the routine: {message}"),
        ScreenState::Loading => {}
        ScreenState::Loaded(_) | ScreenState::Editing(_) => {
            println!("{}", kind.title());
            for Step { kind: step, product } in screen.steps() {
                match product {
                    Some(p) => println!("  {}. {:<18} {} ({}) #{}", step.order(), step.name(), p.name, p.brand, p.id),
                    None => println!("  {}. {:<18} -", step.order(), step.name()),
                }
            }
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
