//! Document management commands.
//!
//! Lists, shows, copies, and deletes saved graph documents.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use resonode_config::paths::DOCUMENT_EXTENSION;
use resonode_config::{
    document_name_from_path, ensure_user_documents_dir, factory_documents,
    get_factory_document, is_factory_document, list_user_documents, load_document,
    save_document, user_config_dir, user_documents_dir,
};
use resonode_core::{Connection, Document};

use super::common;

#[derive(Args)]
pub struct DocumentsArgs {
    #[command(subcommand)]
    command: DocumentsCommand,
}

#[derive(Subcommand)]
enum DocumentsCommand {
    /// List available documents (factory and user)
    List {
        /// Show only factory documents
        #[arg(long)]
        factory: bool,

        /// Show only user documents
        #[arg(long)]
        user: bool,
    },

    /// Show the nodes, wires, and comments of a document
    Show {
        /// Document name or path
        name: String,

        /// Print the document JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Copy a factory document to user documents for editing
    Copy {
        /// Factory document name
        source: String,

        /// New document name (uses the source name if not specified)
        #[arg(short, long)]
        name: Option<String>,

        /// Write to this path instead of the user documents directory
        #[arg(short, long, conflicts_with = "name")]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Delete a user document
    Delete {
        /// Document name to delete
        name: String,
    },

    /// Show document and settings directories
    Paths,
}

pub fn run(args: DocumentsArgs) -> anyhow::Result<()> {
    match args.command {
        DocumentsCommand::List { factory, user } => list_documents(factory, user),
        DocumentsCommand::Show { name, json } => show_document(&name, json),
        DocumentsCommand::Copy {
            source,
            name,
            output,
            force,
        } => copy_document(&source, name.as_deref(), output, force),
        DocumentsCommand::Delete { name } => delete_document(&name),
        DocumentsCommand::Paths => show_paths(),
    }
}

fn list_documents(factory_only: bool, user_only: bool) -> anyhow::Result<()> {
    if !user_only {
        println!("Factory Documents:");
        println!("==================");
        for (name, document) in factory_documents() {
            println!("  {:20} - {}", name, summary(&document));
        }
        println!();
    }

    if !factory_only {
        println!("User Documents:");
        println!("===============");
        let paths = list_user_documents();
        if paths.is_empty() {
            println!("  (none)");
            println!();
            println!("  Start from a factory document with: resonode documents copy <name>\n");
        }
        for path in paths {
            let name = document_name_from_path(&path).unwrap_or_else(|| "unknown".into());
            match load_document(&path) {
                Ok(document) => println!("  {:20} - {}", name, summary(&document)),
                Err(_) => println!("  {name:20} - (error loading)"),
            }
        }
        println!();
    }
    Ok(())
}

fn show_document(name: &str, json: bool) -> anyhow::Result<()> {
    let document = common::load_document(name)?;
    if json {
        println!("{}", document.to_json_pretty()?);
        return Ok(());
    }

    println!("Document: {name}");
    println!("{}", "=".repeat(10 + name.len()));
    println!();

    println!("Nodes ({}):", document.nodes.len());
    for node in &document.nodes {
        println!("  {:6} {}", node.id.to_string(), node.name);
    }

    println!();
    println!("Connections ({}):", document.connections.len());
    for record in &document.connections {
        println!("  {}", Connection::from(record.clone()));
    }

    if !document.comments.is_empty() {
        println!();
        println!("Comments ({}):", document.comments.len());
        for comment in &document.comments {
            let links = comment
                .links
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            println!("  {} [{links}] {}", comment.id, comment.text);
        }
    }
    Ok(())
}

fn copy_document(
    source: &str,
    name: Option<&str>,
    output: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<()> {
    let document = get_factory_document(source)
        .with_context(|| format!("'{source}' is not a factory document"))?;

    let path = match output {
        Some(path) => path,
        None => {
            let name = name.unwrap_or(source);
            if is_factory_document(name) && name != source {
                anyhow::bail!("'{name}' would shadow a factory document");
            }
            ensure_user_documents_dir()?.join(format!("{name}.{DOCUMENT_EXTENSION}"))
        }
    };

    if path.exists() && !force {
        anyhow::bail!("'{}' already exists. Use --force to overwrite.", path.display());
    }
    save_document(&document, &path)?;
    println!("Copied '{source}' to {}", path.display());
    Ok(())
}

fn delete_document(name: &str) -> anyhow::Result<()> {
    if is_factory_document(name) {
        anyhow::bail!("cannot delete factory document '{name}'");
    }
    let path = user_documents_dir().join(format!("{name}.{DOCUMENT_EXTENSION}"));
    if !path.exists() {
        anyhow::bail!("user document '{name}' not found");
    }
    std::fs::remove_file(&path)
        .with_context(|| format!("could not delete '{}'", path.display()))?;
    println!("Deleted {}", path.display());
    Ok(())
}

fn show_paths() -> anyhow::Result<()> {
    println!("Config directory:    {}", display(&user_config_dir()));
    println!("Documents directory: {}", display(&user_documents_dir()));
    println!("Settings file:       {}", display(&resonode_config::settings_path()));
    Ok(())
}

fn display(path: &Path) -> String {
    let marker = if path.exists() { "" } else { " (not created)" };
    format!("{}{marker}", path.display())
}

fn summary(document: &Document) -> String {
    format!(
        "{} nodes, {} connections",
        document.nodes.len(),
        document.connections.len()
    )
}
