//! Basic example of the Wirebox container.

use std::sync::Arc;

use parking_lot::Mutex;
use wirebox::prelude::*;

// === Define your types ===

struct Config {
    database_url: String,
}

struct Database {
    url: String,
    queries: Mutex<Vec<String>>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.queries.lock().push(sql.to_string());
        format!("Results from {}", self.url)
    }
}

struct UserRepository {
    db: Arc<Database>,
    audit: Mutex<Option<String>>,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

fn object<T: Send + Sync + 'static>(value: &Value, class: &str) -> Result<Arc<T>> {
    value
        .as_instance()
        .and_then(|instance| instance.downcast_arc::<T>())
        .ok_or_else(|| ContainerError::Misuse(format!("expected a {class}")))
}

// === Describe them to the container ===

fn catalog() -> TypeCatalog {
    let catalog = TypeCatalog::new();
    catalog
        .register(ClassDescriptor::new("Config").constructor(
            Signature::new("Config::new").param(Parameter::new("database_url").builtin("string")),
            |args| {
                Ok(Config {
                    database_url: args[0].as_str().unwrap_or_default().to_string(),
                })
            },
        ))
        .register(ClassDescriptor::new("Database").constructor(
            Signature::new("Database::new").param(Parameter::new("config").class("Config")),
            |args| {
                let config = object::<Config>(&args[0], "Config")?;
                Ok(Database {
                    url: config.database_url.clone(),
                    queries: Mutex::new(Vec::new()),
                })
            },
        ))
        .register(ClassDescriptor::new("Auditable"))
        .register(
            ClassDescriptor::new("UserRepository")
                .implements("Auditable")
                .constructor(
                    Signature::new("UserRepository::new")
                        .param(Parameter::new("db").class("Database")),
                    |args| {
                        Ok(UserRepository {
                            db: object::<Database>(&args[0], "Database")?,
                            audit: Mutex::new(None),
                        })
                    },
                )
                .property::<UserRepository, _>("audit", |repo, value| {
                    *repo.audit.lock() = value.as_str().map(str::to_string);
                    Ok(())
                }),
        );
    catalog
}

// === Register services lazily ===

struct PersistenceProvider;

impl ServiceProvider for PersistenceProvider {
    fn services(&self) -> Vec<String> {
        vec!["Config".into(), "Database".into()]
    }

    fn register(&self, container: &Container) -> Result<()> {
        container
            .share("Config", "Config")
            .add_argument(Argument::raw("postgres://localhost/myapp"));
        container.share("Database", "Database");
        Ok(())
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("wirebox_container=debug,basic=info")
        .init();

    // Build the container
    let container = Container::builder()
        .reflector(Arc::new(catalog()))
        .service_provider(Arc::new(PersistenceProvider))
        .autowire(true)
        .build()?;

    // Every auditable object leaving the container gets an audit channel
    container
        .inflector("Auditable")
        .set_property("audit", Argument::raw("stdout"));

    println!("✅ Container built successfully!");
    println!("{container:?}");

    // === UserRepository is not registered: it is auto-wired ===
    tracing::info!("Resolving UserRepository through the auto-wiring delegate");
    let repo = container.get("UserRepository")?;
    let repo = object::<UserRepository>(&repo, "UserRepository")?;
    println!("👤 {}", repo.find_user(42));
    println!("📋 Audit channel: {:?}", repo.audit.lock());

    // === Database is shared, so a second repository sees the same one ===
    let other = container.get_new("UserRepository")?;
    let other = object::<UserRepository>(&other, "UserRepository")?;
    println!("👤 {}", other.find_user(7));
    println!(
        "🗄️  Shared database ran {} queries",
        repo.db.queries.lock().len()
    );

    println!("\n🎉 Everything works!");
    Ok(())
}
