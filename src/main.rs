use anyhow::Context;
use chatbot_widget::model::Sender;
use chatbot_widget::{ChatWidget, EventOutcome, HostPage, HttpChatApi, WidgetSettings, embed};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "chatbot-widget")]
#[command(about = "Mount the embeddable chat widget on an HTML page and talk to it")]
struct Cli {
    /// Chat backend base URL (overrides CHATBOT_API_BASE_URL)
    #[arg(long, global = true)]
    api_base_url: Option<Url>,
    /// Host container id (overrides CHATBOT_CONTAINER_ID)
    #[arg(long, global = true)]
    container_id: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount the widget and print the resulting page
    Render {
        /// HTML page embedding the widget
        #[arg(short, long)]
        page: PathBuf,
    },
    /// Mount the widget and chat with it from stdin
    Chat {
        #[arg(short, long)]
        page: PathBuf,
        /// Print the page after the session ends
        #[arg(long)]
        print_page: bool,
    },
    /// Print the markup a site owner pastes to embed the widget
    Snippet {
        #[arg(short, long)]
        business_id: String,
        #[arg(long, default_value = "https://cdn.example.com/chatbot.js")]
        script_url: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = WidgetSettings::from_env()?;
    if let Some(url) = cli.api_base_url {
        settings = settings.with_api_base_url(url);
    }
    if let Some(id) = cli.container_id {
        settings = settings.with_container_id(id);
    }

    match cli.command {
        Commands::Render { page } => {
            let widget = mount(&page, &settings).await?;
            println!("{}", widget.page().to_html());
        }
        Commands::Chat { page, print_page } => {
            let mut widget = mount(&page, &settings).await?;
            chat_loop(&mut widget).await?;
            if print_page {
                println!("{}", widget.page().to_html());
            }
        }
        Commands::Snippet {
            business_id,
            script_url,
        } => {
            print!(
                "{}",
                embed::snippet(&script_url, &business_id, &settings.container_id)?
            );
        }
    }
    Ok(())
}

async fn mount(path: &Path, settings: &WidgetSettings) -> anyhow::Result<ChatWidget> {
    let page = load_page(path).await?;
    let api = Arc::new(HttpChatApi::new(settings)?);
    let widget = ChatWidget::mount(&page, settings, api)
        .await
        .context("chatbot widget not shown")?;
    Ok(widget)
}

async fn load_page(path: &Path) -> anyhow::Result<HostPage> {
    let html = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading page {:?}", path))?;
    Ok(HostPage::parse(&html))
}

async fn chat_loop(widget: &mut ChatWidget) -> anyhow::Result<()> {
    let agent = widget.theme().agent_name.clone();
    for message in widget.messages() {
        print_message(&agent, message.sender, &message.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim() == "/toggle" {
            let state = widget.toggle();
            println!("[panel {:?}]", state);
            continue;
        }
        match widget.ask(&line).await? {
            EventOutcome::Answered(reply) => print_message(&agent, reply.sender, &reply.text),
            EventOutcome::Rejected | EventOutcome::Ignored | EventOutcome::Toggled(_) => {}
        }
    }
    Ok(())
}

fn print_message(agent: &str, sender: Sender, text: &str) {
    match sender {
        Sender::Bot => println!("{agent}: {text}"),
        Sender::User => println!("you: {text}"),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn loads_page_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"<html><head><script src="/chatbot.js" data-business-id="acme"></script></head><body></body></html>"#
        )
        .unwrap();
        let page = load_page(file.path()).await.unwrap();
        assert_eq!(page.select_all("script").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_page_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_page(&dir.path().join("nope.html")).await.is_err());
    }

    #[test]
    fn cli_parses_global_overrides() {
        let cli = Cli::try_parse_from([
            "chatbot-widget",
            "render",
            "--page",
            "index.html",
            "--api-base-url",
            "http://localhost:8000",
        ])
        .unwrap();
        assert_eq!(cli.api_base_url.unwrap().as_str(), "http://localhost:8000/");
        assert!(matches!(cli.command, Commands::Render { .. }));
    }
}
