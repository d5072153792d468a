use clap::{Parser, Subcommand};
use school_portal::client::{
    HttpAccountApi, LoginField, LoginForm, RegisterField, RegisterForm, Session,
};

#[derive(Parser)]
#[command(name = "portal-client", about = "Log in to or register with the school portal")]
struct Args {
    #[arg(
        long,
        env = "PORTAL_URL",
        default_value = "http://localhost:5000",
        help = "Base URL of the portal API"
    )]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in with a username and password
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Register a new account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        email: String,
    },
    /// Create the demo account student1 / 123456
    TestUser,
}

fn print_banners(error: Option<&str>, message: Option<&str>) {
    if let Some(error) = error {
        eprintln!("error: {error}");
    }
    if let Some(message) = message {
        println!("{message}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let api = HttpAccountApi::new(args.url);

    let ok = match args.command {
        Command::Login { username, password } => {
            let mut form = LoginForm::default();
            form.set_field(LoginField::Username, username);
            form.set_field(LoginField::Password, password);
            let mut session = Session::default();
            if let Some(user) = form.submit(&api).await {
                session.sign_in(user);
            }
            print_banners(form.error.as_deref(), form.message.as_deref());
            if let Some(user) = session.user() {
                println!(
                    "logged in as {} (id {}, email {})",
                    user.username,
                    user.id,
                    user.email.as_deref().unwrap_or("-")
                );
            }
            session.is_logged_in()
        }
        Command::Register {
            username,
            password,
            email,
        } => {
            let mut form = RegisterForm::default();
            form.set_field(RegisterField::Username, username);
            form.set_field(RegisterField::Password, password);
            form.set_field(RegisterField::Email, email);
            let user_id = form.submit(&api).await;
            print_banners(form.error.as_deref(), form.message.as_deref());
            if let Some(id) = user_id {
                println!("user id {id}");
            }
            form.error.is_none()
        }
        Command::TestUser => {
            let mut form = LoginForm::default();
            form.create_test_user(&api).await;
            print_banners(form.error.as_deref(), form.message.as_deref());
            form.error.is_none()
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
