//! CLI: inspect and edit schema-described documents from the shell.
//!
//! Every engine operation is reachable here: tree building, path reads and
//! writes, array moves, cursor mapping, and derived defaults.

use std::path::{Path as FsPath, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use tracing::debug;

use schemadoc::position::{self, CursorPosition};
use schemadoc::tree::{filter_populated_nodes, TreeBuilder, TreeNode};
use schemadoc::{ops, SchemaClass, SchemaNode, SchemaResolver};

// -------------------------------- Types ----------------------------------- //

/// navigate and edit YAML/JSON documents through their JSON Schema
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// build the navigable tree for a schema + document pair
    Tree(TreeArgs),
    /// read the value at a path
    Get(GetArgs),
    /// write a value at a path and print the updated document
    Set(SetArgs),
    /// delete the value at a path and print the updated document
    Delete(DeleteArgs),
    /// move an array element and print the updated document
    Move(MoveArgs),
    /// map a cursor position to a document path
    Locate(LocateArgs),
    /// print the schema-derived default value
    Defaults(DefaultsArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

#[derive(Args, Debug, Clone)]
struct DocumentInput {
    /// document file (YAML, JSON, or JSONC)
    doc: PathBuf,

    /// override the format sniffed from the file extension
    #[arg(long, value_enum)]
    format: Option<Format>,
}

#[derive(Args, Debug)]
struct TreeArgs {
    #[command(flatten)]
    input: DocumentInput,

    /// schema file (JSON or YAML)
    #[arg(short, long)]
    schema: PathBuf,

    /// keep only populated branches
    #[arg(long)]
    populated: bool,
}

#[derive(Args, Debug)]
struct GetArgs {
    #[command(flatten)]
    input: DocumentInput,

    /// path string, e.g. `user.addresses[0].street`
    path: String,
}

#[derive(Args, Debug)]
struct SetArgs {
    #[command(flatten)]
    input: DocumentInput,

    path: String,

    /// new value as JSON; unparsable input is taken as a bare string
    value: String,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    #[command(flatten)]
    input: DocumentInput,

    path: String,
}

#[derive(Args, Debug)]
struct MoveArgs {
    #[command(flatten)]
    input: DocumentInput,

    /// path of the array to reorder
    path: String,

    #[arg(long)]
    from: usize,

    #[arg(long)]
    to: usize,
}

#[derive(Args, Debug)]
struct LocateArgs {
    #[command(flatten)]
    input: DocumentInput,

    #[arg(short, long)]
    line: usize,

    #[arg(short, long)]
    column: usize,
}

#[derive(Args, Debug)]
struct DefaultsArgs {
    /// schema file (JSON or YAML)
    #[arg(short, long)]
    schema: PathBuf,

    /// derive the default of a `#/…` pointer instead of the root
    #[arg(long)]
    at: Option<String>,
}

// ---------------------------- Implementation ------------------------------ //

pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Tree(args) => {
                let schema = load_schema(&args.schema)?;
                let (value, _) = args.input.load()?;
                let mut resolver = SchemaResolver::new(schema.clone());
                let mut nodes = TreeBuilder::new(&mut resolver)
                    .build(&schema, &value)
                    .context("building the document tree")?;
                if args.populated {
                    nodes = filter_populated_nodes(nodes);
                }
                print_tree(&nodes, 0);
                Ok(())
            }
            Command::Get(args) => {
                let (value, _) = args.input.load()?;
                let path = schemadoc::Path::parse(&args.path);
                match ops::get_value_at_path(&value, &path) {
                    Some(found) => {
                        println!("{}", serde_json::to_string_pretty(found)?);
                        Ok(())
                    }
                    None => bail!("no value at `{path}`"),
                }
            }
            Command::Set(args) => {
                let (value, format) = args.input.load()?;
                let path = schemadoc::Path::parse(&args.path);
                let new_value = serde_json::from_str(&args.value)
                    .unwrap_or_else(|_| Value::String(args.value.clone()));
                let updated = ops::set_value_at_path(&value, &path, new_value);
                emit(&updated, format)
            }
            Command::Delete(args) => {
                let (value, format) = args.input.load()?;
                let path = schemadoc::Path::parse(&args.path);
                let updated = ops::delete_at_path(&value, &path);
                emit(&updated, format)
            }
            Command::Move(args) => {
                let (value, format) = args.input.load()?;
                let path = schemadoc::Path::parse(&args.path);
                let updated = ops::move_array_element(&value, &path, args.from, args.to)
                    .with_context(|| format!("moving within `{path}`"))?;
                emit(&updated, format)
            }
            Command::Locate(args) => {
                let text = read_text(&args.input.doc)?;
                let format = args.input.effective_format()?;
                let position = CursorPosition {
                    line: args.line,
                    column: args.column,
                };
                match position::path_at_position(&text, position, format.into()) {
                    Some(path) => println!("{path}"),
                    None => println!("(no path)"),
                }
                Ok(())
            }
            Command::Defaults(args) => {
                let schema = load_schema(&args.schema)?;
                let mut resolver = SchemaResolver::new(schema.clone());
                let target = match &args.at {
                    Some(pointer) => {
                        let node = SchemaNode {
                            reference: Some(pointer.clone()),
                            ..SchemaNode::default()
                        };
                        resolver.resolve(&node)?
                    }
                    None => schema,
                };
                let default = resolver.get_default_value(&target)?;
                println!("{}", serde_json::to_string_pretty(&default)?);
                Ok(())
            }
        }
    }
}

impl DocumentInput {
    fn effective_format(&self) -> anyhow::Result<Format> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        match self.doc.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") | Some("jsonc") => Ok(Format::Json),
            other => bail!(
                "cannot infer the document format from extension {other:?}; pass --format"
            ),
        }
    }

    fn load(&self) -> anyhow::Result<(Value, Format)> {
        let format = self.effective_format()?;
        let text = read_text(&self.doc)?;
        debug!(doc = %self.doc.display(), ?format, "loading document");
        let value = match format {
            Format::Yaml => schemadoc::de::from_yaml_str(&text)?,
            Format::Json => schemadoc::de::from_json_str(&text)?,
        };
        Ok((value, format))
    }
}

impl From<Format> for position::DocumentFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Yaml => position::DocumentFormat::Yaml,
            Format::Json => position::DocumentFormat::Json,
        }
    }
}

// ---------------------------- Internal helpers ---------------------------- //

fn read_text(path: &FsPath) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))
}

/// Schemas may be authored in JSON or YAML; sniff by extension, JSON being
/// the default.
fn load_schema(path: &FsPath) -> anyhow::Result<SchemaNode> {
    let text = read_text(path)?;
    let schema = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => schemadoc::de::from_yaml_str(&text)?,
        _ => schemadoc::de::from_json_str(&text)?,
    };
    Ok(schema)
}

fn emit(value: &Value, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Yaml => print!("{}", serde_yaml::to_string(value)?),
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn print_tree(nodes: &[TreeNode], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        let kind = match node.kind {
            SchemaClass::Object => node.kind.as_str().blue(),
            SchemaClass::Array => node.kind.as_str().magenta(),
            SchemaClass::Dictionary => node.kind.as_str().cyan(),
            SchemaClass::Variant => node.kind.as_str().yellow(),
            SchemaClass::Primitive => node.kind.as_str().normal(),
        };
        let marker = if node.is_placeholder {
            "+".dimmed()
        } else if node.has_value {
            "*".green()
        } else {
            "-".dimmed()
        };
        let mut extras = Vec::new();
        if node.is_required {
            extras.push("required".to_string());
        }
        if let Some(count) = node.item_count {
            extras.push(format!("{count} items"));
        }
        let extras = if extras.is_empty() {
            String::new()
        } else {
            format!(" ({})", extras.join(", "))
        };
        println!("{indent}{marker} {} [{kind}]{extras}", node.title.bold());
        if let Some(children) = &node.children {
            print_tree(children, depth + 1);
        }
    }
}
