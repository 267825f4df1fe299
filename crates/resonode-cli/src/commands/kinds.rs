//! Node palette listing.

#![allow(clippy::print_literal)] // Table headers use literal strings

use clap::Args;
use resonode_core::{ControlKind, ControlSpec, SocketSpec};
use resonode_registry::{NodeCategory, NodeDescriptor, NodeRegistry};

#[derive(Args)]
pub struct KindsArgs {
    /// Show sockets and controls of one kind (label or tag)
    #[arg(value_name = "KIND")]
    kind: Option<String>,

    /// Only list kinds in this category
    #[arg(short, long)]
    category: Option<String>,
}

pub fn run(args: KindsArgs) -> anyhow::Result<()> {
    let registry = NodeRegistry::new();

    if let Some(name) = &args.kind {
        let descriptor = registry
            .find(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown node kind: {name}"))?;
        print_details(descriptor);
        return Ok(());
    }

    let categories: Vec<NodeCategory> = match &args.category {
        Some(name) => vec![
            NodeCategory::parse(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown category: {name}"))?,
        ],
        None => NodeCategory::ALL.to_vec(),
    };

    println!("Available Node Kinds");
    println!("====================");
    for category in categories {
        println!();
        println!("{} - {}", category.name(), category.description());
        println!("  {:30}  {:30}  {}", "Label", "Tag", "Description");
        println!("  {:30}  {:30}  {}", "-----", "---", "-----------");
        for node in registry.nodes_in_category(category) {
            println!(
                "  {:30}  {:30}  {}",
                node.label,
                node.kind.tag(),
                node.description
            );
        }
    }
    Ok(())
}

fn print_details(descriptor: &NodeDescriptor) {
    let kind = descriptor.kind;
    println!("{}", descriptor.label);
    println!("{}", "=".repeat(descriptor.label.len()));
    println!();
    println!("{}", descriptor.description);
    println!("Tag: {}", kind.tag());
    println!("Category: {}", descriptor.category.name());

    println!();
    println!("Inputs:");
    print_sockets(kind.inputs());
    println!("Outputs:");
    print_sockets(kind.outputs());

    println!("Controls:");
    if kind.controls().is_empty() {
        println!("  (none)");
    }
    for control in kind.controls() {
        println!(
            "  {:14}  {:20}  {}{}",
            control.key,
            control.label,
            describe_control(control),
            if control.live { "  [live]" } else { "" }
        );
    }
}

fn print_sockets(sockets: &[SocketSpec]) {
    if sockets.is_empty() {
        println!("  (none)");
    }
    for socket in sockets {
        let inline = socket
            .inline_control
            .map(|c| format!(", inline '{c}'"))
            .unwrap_or_default();
        println!(
            "  {:22}  {:?}, {:?}{}",
            socket.name, socket.combine, socket.multiplicity, inline
        );
    }
}

fn describe_control(control: &ControlSpec) -> String {
    match control.value {
        ControlKind::Number { default, min, max } => {
            let bounded = |v: f64| v > f64::MIN && v < f64::MAX;
            match (bounded(min), bounded(max)) {
                (true, true) => format!("{default} in [{min}, {max}]"),
                (true, false) => format!("{default}, at least {min}"),
                (false, true) => format!("{default}, at most {max}"),
                (false, false) => format!("{default}"),
            }
        }
        ControlKind::Choice { default, options } => {
            format!("{default} (one of {})", options.join(", "))
        }
        ControlKind::Key { default } => format!("{default} (key code)"),
        ControlKind::Profile => "ADSR profile".to_string(),
    }
}
