use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use housing_storefront::admin::{AdminConsole, CategoryForm, NewImage, OpenError, PropertyForm};
use housing_storefront::api::ReqwestTransport;
use housing_storefront::filters::{FilterBar, Location};
use housing_storefront::session::store::FileTokenStore;
use housing_storefront::views::{ListingView, PropertyDetail};
use housing_storefront::{ApiClient, ApiError, Config, FetchMode, Session};

#[derive(Parser)]
#[command(name = "housing-storefront")]
#[command(about = "Browse property listings and manage them from the admin console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// REST API base URL (overrides STOREFRONT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the session tokens are kept (overrides STOREFRONT_TOKEN_FILE)
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List properties matching the filters
    List(ListArgs),
    /// Show one property by slug
    Show { slug: String },
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    Logout,
    /// Report whether the stored session is usable
    Status,
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Args)]
struct ListArgs {
    /// Start from a full query string, e.g. "?city=Faro&page=2"
    #[arg(long)]
    query: Option<String>,
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    min_price: Option<String>,
    #[arg(long)]
    max_price: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    country: Option<String>,
    /// price, -price, -created_at or created_at
    #[arg(long)]
    ordering: Option<String>,
    #[arg(long)]
    page: Option<u32>,
}

#[derive(Subcommand)]
enum AdminCommands {
    Properties,
    Categories {
        /// Show a single category
        #[arg(long)]
        slug: Option<String>,
    },
    Contact,
    AddProperty(PropertyArgs),
    EditProperty {
        #[arg(long)]
        id: u64,
        #[command(flatten)]
        fields: PropertyArgs,
    },
    DeleteProperty {
        #[arg(long)]
        id: u64,
    },
    AddCategory {
        #[arg(long)]
        name: String,
    },
    RenameCategory {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        name: String,
    },
    DeleteCategory {
        #[arg(long)]
        id: u64,
    },
    UpdateContact {
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        whatsapp: Option<String>,
    },
}

#[derive(Args)]
struct PropertyArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    price: Option<String>,
    /// Category id
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    country: Option<String>,
    /// Image file to upload (repeatable)
    #[arg(long = "image")]
    images: Vec<PathBuf>,
    /// Index among the uploaded images to mark as primary
    #[arg(long)]
    primary: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(path) = cli.token_file {
        config.token_file = path;
    }

    let store = Arc::new(FileTokenStore::open(&config.token_file).context("Failed to open token store")?);
    let transport = Arc::new(ReqwestTransport::new(config.timeout).context("Failed to create HTTP client")?);
    let client = ApiClient::new(config.api_url.clone(), transport, store.clone());
    let mut session = Session::new(client, store);

    match cli.command {
        Commands::List(args) => list(&session, &config, args).await?,
        Commands::Show { slug } => show(&session, &slug).await?,
        Commands::Login { username, password } => {
            session.login(&username, &password).await.context("Login failed")?;
            info!("🔑 Logged in, tokens saved to {}", config.token_file.display());
        }
        Commands::Logout => {
            session.logout();
            info!("Logged out");
        }
        Commands::Status => {
            let state = session.check_session().await;
            println!("Session: {:?}", state);
        }
        Commands::Admin(command) => {
            session.check_session().await;
            admin(&session, command).await?;
        }
    }

    Ok(())
}

async fn list(session: &Session, config: &Config, args: ListArgs) -> Result<()> {
    let mut location = Location::new(&format!("/{}", normalize_query(args.query.as_deref())))?;
    let mut bar = FilterBar::from_location(&location);

    let fields = [
        ("search", args.search),
        ("category", args.category),
        ("min_price", args.min_price),
        ("max_price", args.max_price),
        ("city", args.city),
        ("state", args.state),
        ("country", args.country),
        ("ordering", args.ordering),
    ];
    let edited = fields.iter().any(|(_, v)| v.is_some());
    for (name, value) in fields {
        if let Some(value) = value {
            bar.set(name, &value);
        }
    }

    if edited {
        bar.apply(&mut location)?;
    }
    if let Some(page) = args.page {
        location.push(&location.page_href(page))?;
    }

    let view = ListingView::load(session.client(), &location, config.page_size, FetchMode::NoStore).await?;

    info!("🏠 {} properties match ({})", view.page.count, view.criteria);
    if let Some(order) = &view.criteria.ordering {
        info!("Sorted by {}", order.label());
    }
    if view.is_empty() {
        println!("No properties found. Try adjusting your filters.");
        return Ok(());
    }

    for (i, card) in view.cards().iter().enumerate() {
        println!("{}. {} ({})", i + 1, card.title, card.price);
        println!("   {} · {}", card.category, card.location);
        println!("   {}", card.href);
        println!();
    }

    if let Some(pagination) = &view.pagination {
        let pages: Vec<String> = pagination
            .window
            .iter()
            .map(|&p| if pagination.is_current(p) { format!("[{p}]") } else { p.to_string() })
            .collect();
        println!(
            "{} {} {}",
            if pagination.has_previous { "‹" } else { " " },
            pages.join(" "),
            if pagination.has_next { "›" } else { " " }
        );
        if let Some(href) = pagination.next_href(&location) {
            println!("Next page: {}", href);
        }
    }

    Ok(())
}

/// Accepts `city=Faro`, `?city=Faro` or `/?city=Faro`
fn normalize_query(query: Option<&str>) -> String {
    let query = query.unwrap_or("").trim().trim_start_matches('/');
    let query = query.strip_prefix('?').unwrap_or(query);
    if query.is_empty() {
        String::new()
    } else {
        format!("?{query}")
    }
}

async fn show(session: &Session, slug: &str) -> Result<()> {
    let detail = match PropertyDetail::load(session.client(), slug, FetchMode::NoStore).await {
        Ok(detail) => detail,
        Err(ApiError::NotFound(what)) => bail!("{} not found", what),
        Err(e) => return Err(e.into()),
    };

    let property = &detail.property;
    println!("{} ({})", property.title, detail.price_label());
    println!("{} · {}", property.category.name, property.location_line());
    println!("{}", detail.listed_on());
    println!();
    println!("{}", property.description);
    println!();
    for (i, image) in property.images.iter().enumerate() {
        let marker = if Some(image.id) == property.primary_image.as_ref().map(|p| p.id) { "*" } else { " " };
        println!("{} image {}: {}", marker, i + 1, image.image);
    }

    let links = detail.contact_links();
    println!();
    println!("WhatsApp: {}", links.whatsapp);
    println!("Call:     {}", links.phone);
    println!("Email:    {}", links.email);

    Ok(())
}

async fn admin(session: &Session, command: AdminCommands) -> Result<()> {
    let mut console = match AdminConsole::open(session).await {
        Ok(console) => console,
        Err(OpenError::Redirect(_)) => bail!("Not logged in. Run `housing-storefront login` first."),
    };
    let client = console.client().clone();

    match command {
        AdminCommands::Properties => {
            for property in console.properties.items() {
                println!(
                    "#{} {} | {} | {} | {}",
                    property.id,
                    property.title,
                    property.category.name,
                    property.location_line(),
                    housing_storefront::views::format_currency(property.price)
                );
            }
        }
        AdminCommands::Categories { slug: Some(slug) } => {
            let category = client.get_category(&slug, FetchMode::NoStore).await?;
            println!("#{} {} ({})", category.id, category.name, category.slug);
        }
        AdminCommands::Categories { slug: None } => {
            for category in console.categories.items() {
                println!("#{} {} ({})", category.id, category.name, category.slug);
            }
        }
        AdminCommands::Contact => match console.contact.info() {
            Some(info) => {
                println!("Phone:    {}", info.phone_number);
                println!("Email:    {}", info.email);
                println!("WhatsApp: {}", info.whatsapp_number);
            }
            None => println!("No contact information on record."),
        },
        AdminCommands::AddProperty(args) => {
            let mut form = PropertyForm::new();
            fill_property_form(&mut form, args).await?;
            let saved = console.properties.submit(&client, &mut form).await.map_err(|e| report(e, form.errors()))?;
            info!("✅ Created property #{} ({})", saved.id, saved.slug);
        }
        AdminCommands::EditProperty { id, fields } => {
            let Some(property) = console.properties.items().iter().find(|p| p.id == id).cloned() else {
                bail!("Property #{} not found", id);
            };
            let mut form = PropertyForm::edit(&property);
            fill_property_form(&mut form, fields).await?;
            let saved = console.properties.submit(&client, &mut form).await.map_err(|e| report(e, form.errors()))?;
            info!("✅ Updated property #{} ({})", saved.id, saved.slug);
        }
        AdminCommands::DeleteProperty { id } => {
            console.properties.delete(&client, id).await?;
            info!("🗑️ Deleted property #{}, {} left", id, console.properties.items().len());
        }
        AdminCommands::AddCategory { name } => {
            let mut form = CategoryForm::new(&name);
            let created = console.categories.add(&client, &mut form).await?;
            info!("✅ Created category #{} ({})", created.id, created.slug);
        }
        AdminCommands::RenameCategory { id, name } => {
            let Some(category) = console.categories.items().iter().find(|c| c.id == id).cloned() else {
                bail!("Category #{} not found", id);
            };
            let mut form = CategoryForm::new(&name);
            console.categories.rename(&client, &category, &mut form).await?;
            info!("✅ Renamed category #{} to {}", id, name);
        }
        AdminCommands::DeleteCategory { id } => {
            if let Err(e) = console.categories.delete(&client, id).await {
                let message = console.categories.error().map(str::to_string).unwrap_or_else(|| e.to_string());
                bail!(message);
            }
            info!("🗑️ Deleted category #{}", id);
        }
        AdminCommands::UpdateContact { phone, email, whatsapp } => {
            let mut form = console.contact.form();
            for (name, value) in [("phone_number", phone), ("email", email), ("whatsapp_number", whatsapp)] {
                if let Some(value) = value {
                    form.set(name, &value);
                }
            }
            console.contact.submit(&client, &mut form).await.map_err(|e| report(e, form.errors()))?;
            if let Some(message) = form.success() {
                info!("✅ {}", message);
            }
        }
    }

    Ok(())
}

async fn fill_property_form(form: &mut PropertyForm, args: PropertyArgs) -> Result<()> {
    let fields = [
        ("title", args.title),
        ("description", args.description),
        ("price", args.price),
        ("category", args.category),
        ("city", args.city),
        ("state", args.state),
        ("country", args.country),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            form.set(name, &value);
        }
    }

    let mut uploads = Vec::new();
    for path in &args.images {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        uploads.push(NewImage::new(file_name, bytes));
    }

    if !uploads.is_empty() && !form.attach(uploads) {
        warn!("Image limit reached, nothing attached");
    }
    if let Some(index) = args.primary {
        if !form.images.set_primary_added(index) {
            warn!("No uploaded image at index {}, keeping current primary", index);
        }
    }

    Ok(())
}

fn report(err: ApiError, errors: &housing_storefront::FieldErrors) -> anyhow::Error {
    for (field, message) in errors.iter() {
        warn!("{}: {}", field, message);
    }
    anyhow::Error::new(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_forms_resolve_to_same_location() {
        for raw in ["city=Faro&page=2", "?city=Faro&page=2", "/?city=Faro&page=2", " /?city=Faro&page=2 "] {
            let location = Location::new(&format!("/{}", normalize_query(Some(raw)))).unwrap();
            assert_eq!(location.href(), "/?city=Faro&page=2", "input {raw:?}");
        }
    }

    #[test]
    fn test_empty_query_is_bare_path() {
        assert_eq!(normalize_query(None), "");
        assert_eq!(normalize_query(Some("/")), "");
        assert_eq!(normalize_query(Some("?")), "");
    }
}
