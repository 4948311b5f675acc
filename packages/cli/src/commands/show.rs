use super::OpenBundle;
use anyhow::Result;
use casebundle_tree::{NodeKind, Tree};
use clap::Args;
use colored::Colorize;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Print node ids next to names
    #[arg(long)]
    pub ids: bool,
}

pub async fn show(args: ShowArgs, cwd: &str) -> Result<()> {
    let bundle = OpenBundle::open(cwd).await?;
    let tree = bundle.sync.service().snapshot();

    println!(
        "{} {} {}",
        "📚".bright_blue(),
        tree.root_name().bold(),
        format!("[{}]", bundle.config.bundle_file).dimmed()
    );
    if tree.is_empty() {
        println!("  {}", "(empty)".dimmed());
        return Ok(());
    }

    for line in render(&tree, args.ids) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per node, indented by depth
fn render(tree: &Tree, with_ids: bool) -> Vec<String> {
    let mut lines = Vec::new();
    render_children(tree, None, 1, with_ids, &mut lines);
    lines
}

fn render_children(
    tree: &Tree,
    parent: Option<&str>,
    depth: usize,
    with_ids: bool,
    out: &mut Vec<String>,
) {
    for entry in tree.child_entries(parent) {
        let indent = "  ".repeat(depth);
        let label = match entry.kind {
            NodeKind::Folder => format!("{}/", entry.name).blue().bold().to_string(),
            NodeKind::File => entry.name.clone(),
        };

        if with_ids {
            out.push(format!("{}{} {}", indent, label, format!("({})", entry.id).dimmed()));
        } else {
            out.push(format!("{}{}", indent, label));
        }

        if entry.is_folder() {
            render_children(tree, Some(entry.id.as_str()), depth + 1, with_ids, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casebundle_tree::Node;

    #[test]
    fn test_render_nests_by_depth() {
        colored::control::set_override(false);
        let tree = Tree::from_root(Node::folder(
            "b1",
            "Bundle",
            vec![
                Node::folder("x", "Pleadings", vec![Node::file("c", "Claim.pdf")]),
                Node::file("a", "Index.pdf"),
            ],
        ))
        .unwrap();

        assert_eq!(
            render(&tree, true),
            vec!["  Pleadings/ (x)", "    Claim.pdf (c)", "  Index.pdf (a)"]
        );
    }
}
