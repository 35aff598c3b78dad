//! Ctrling CLI - inspect and exercise control panels

use std::fs;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;

use ctrling::{
    descriptor, generate, ControlView, CtrlError, FixSuggestion, Node, Notification, NullSurface,
    Outcome, Panel, PanelConfig, Scope, UserEvent,
};

/// Root name used when the config does not set `ref`
const DEFAULT_REFERENCE: &str = "root";

#[derive(Parser)]
#[command(name = "ctrling")]
#[command(about = "Declarative control panels bound to JSON objects")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a control list and report what it contains
    Check {
        /// Path to the JSON control list
        file: String,
    },

    /// Bind a control list to a root object and print the panel
    Render {
        /// Path to the JSON control list
        file: String,

        /// Path to the JSON root object
        #[arg(short, long)]
        root: String,

        /// Panel config (YAML or JSON)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Print controls generated from a root object's shape
    Generate {
        /// Path to the JSON root object
        root: String,
    },

    /// Simulate user input on one control and print the updated root
    Set {
        /// Path to the JSON control list
        file: String,

        /// Path to the JSON root object
        #[arg(short, long)]
        root: String,

        /// Control position
        #[arg(short, long)]
        index: usize,

        /// Input value (JSON literal, or plain text)
        #[arg(short, long)]
        value: String,

        /// Field of a vector control
        #[arg(short, long)]
        field: Option<usize>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { file } => check(&file),
        Commands::Render { file, root, config } => render(&file, &root, config.as_deref()),
        Commands::Generate { root } => generate_controls(&root),
        Commands::Set {
            file,
            root,
            index,
            value,
            field,
        } => set(&file, &root, index, &value, field),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn check(file: &str) -> Result<(), CtrlError> {
    let json = fs::read_to_string(file)?;
    let descriptors = descriptor::parse_list(&json)?;

    println!("{} Control list '{}' is valid", "✓".green(), file);
    println!("  Controls: {}", descriptors.len());
    for (index, d) in descriptors.iter().enumerate() {
        let path = d
            .path
            .as_ref()
            .map(|p| p.all().join(", "))
            .unwrap_or_else(|| "-".to_string());
        println!("  {:>3}  {:<12} {}", index, d.kind.name().cyan(), path);
    }
    Ok(())
}

fn load_root(path: &str) -> Result<Node, CtrlError> {
    let json = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&json)?;
    Ok(Node::from(value))
}

fn load_config(path: Option<&str>) -> Result<PanelConfig, CtrlError> {
    let mut config = match path {
        Some(path) => PanelConfig::load(path)?,
        None => PanelConfig::default(),
    };
    if config.reference.is_empty() {
        config.reference = DEFAULT_REFERENCE.to_string();
    }
    Ok(config)
}

fn render(file: &str, root: &str, config: Option<&str>) -> Result<(), CtrlError> {
    let config = load_config(config)?;
    let scope = Scope::new().with_root(&config.reference, load_root(root)?);
    let json = fs::read_to_string(file)?;
    let panel = Panel::from_json(scope, config, NullSurface, &json);

    for view in panel.views() {
        print_view(&view);
    }
    Ok(())
}

fn print_view(view: &ControlView) {
    let unit = view.unit.as_deref().unwrap_or("");
    let mut line = format!(
        "{:<12} {:<16} {} {}",
        view.kind.name(),
        view.label,
        view.display,
        unit
    );
    line.truncate(line.trim_end().len());
    if view.disabled {
        println!("{}", line.dimmed());
    } else {
        println!("{line}");
    }
}

fn generate_controls(root: &str) -> Result<(), CtrlError> {
    let descriptors = generate::descriptors_from(&load_root(root)?);
    println!("{}", serde_json::to_string_pretty(&descriptors)?);
    Ok(())
}

fn set(
    file: &str,
    root: &str,
    index: usize,
    value: &str,
    field: Option<usize>,
) -> Result<(), CtrlError> {
    let config = load_config(None)?;
    let reference = config.reference.clone();
    let scope = Scope::new().with_root(&reference, load_root(root)?);
    scope.register_notifier("cli", |notification| {
        if let Notification::Changed { key, value, .. } = notification {
            eprintln!(
                "{} {} = {}",
                "→".cyan(),
                key.unwrap_or("$"),
                serde_json::to_string(value).unwrap_or_default()
            );
        }
    });

    let json = fs::read_to_string(file)?;
    let mut panel = Panel::from_json(
        scope.clone(),
        PanelConfig {
            callback: Some("cli".to_string()),
            ..config
        },
        NullSurface,
        &json,
    );

    // JSON literals keep their type (`true`, `3`); anything else is text
    let input = serde_json::from_str::<Value>(value)
        .map(Node::from)
        .unwrap_or_else(|_| Node::from(value));
    let event = match field {
        Some(index) => UserEvent::Field {
            index,
            value: input,
        },
        None => match panel.descriptor(index).map(|d| d.kind) {
            Some(ctrling::ControlKind::Button) => UserEvent::Click,
            _ => UserEvent::Input(input),
        },
    };

    if panel.dispatch_at(index, event)? == Outcome::Ignored {
        println!("{} control {} did not accept the input", "!".yellow(), index);
    }

    let root = scope.get(&reference).unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&root)?);
    Ok(())
}
