//! Minimal CLI: registry file + documents → (describe | map)
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::debug;
use serde_json::{Value, json};

use crate::descriptor::FieldMetadata;
use crate::json::JsonMapper;
use crate::registry::TypeRegistry;
use crate::registry_file::load_registry;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// map JSON documents onto classes declared in a registry file, and back
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the field metadata of a class as JSON
    Describe(DescribeOut),
    /// deserialize each document into a class and serialize it back
    Map(MapOut),
}

#[derive(Args, Debug, Clone)]
struct TypeSettings {
    /// registry file declaring enums and classes
    #[arg(long)]
    types: PathBuf,

    /// class name
    #[arg(long = "type")]
    class: String,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    #[command(flatten)]
    type_settings: TypeSettings,
}

#[derive(clap::Parser, Debug)]
struct MapOut {
    #[command(flatten)]
    type_settings: TypeSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// output file, one JSON document per line (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One input document, or the reason it could not be produced.
struct Document {
    label: String,
    value: Result<Value>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeSettings {
    fn load(&self) -> Result<TypeRegistry> {
        let registry = load_registry(&self.types)?;
        if registry.class(&self.class).is_none() {
            return Err(anyhow!(
                "class `{}` is not declared in {}",
                self.class,
                self.types.display()
            ));
        }
        Ok(registry)
    }
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths =
            resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            let label = source_path.to_string_lossy().to_string();
            if self.ndjson {
                for (index, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.process(format!("{label}:{}", index + 1), line, &mut documents);
                }
            } else {
                self.process(label, &source, &mut documents);
            }
        }
        Ok(documents)
    }

    fn process(&self, label: String, source: &str, documents: &mut Vec<Document>) {
        let value = serde_json::from_str::<Value>(source)
            .with_context(|| format!("failed to parse JSON source ({label})"))
            .and_then(|value| self.select(&label, value));
        let values = match value {
            Ok(xs) => xs,
            Err(error) => {
                documents.push(Document { label, value: Err(error) });
                return;
            }
        };
        if let [value] = values.as_slice() {
            documents.push(Document { label, value: Ok(value.clone()) });
            return;
        }
        for (index, value) in values.into_iter().enumerate() {
            documents.push(Document { label: format!("{label}#{index}"), value: Ok(value) });
        }
    }

    /// Applies the JSON pointer, then the jq filter.
    fn select(&self, label: &str, value: Value) -> Result<Vec<Value>> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(pointer) => value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {label}"))?,
        };
        match self.jq_expr.as_deref() {
            None => Ok(vec![value]),
            Some(jq_expr) => crate::jq_exec::run_jaq(jq_expr, &value)
                .with_context(|| format!("failed to apply jq expression to source ({label})")),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Describe(target) => {
                let registry = target.type_settings.load()?;
                let fields = registry.describe(&target.type_settings.class).unwrap_or_default();
                let view = Value::Array(fields.iter().map(describe_field).collect());
                println!("{}", serde_json::to_string_pretty(&view)?);
                Ok(ExitCode::SUCCESS)
            }
            Command::Map(target) => {
                let class = &target.type_settings.class;
                let mapper = JsonMapper::new(target.type_settings.load()?);
                let documents = target.input_settings.load_documents()?;
                debug!("mapping {} document(s) onto `{class}`", documents.len());

                let mut lines = Vec::with_capacity(documents.len());
                let mut failures = 0usize;
                for document in documents {
                    let mapped = document.value.and_then(|value| {
                        let object = mapper.from_value(&value, class)?;
                        Ok(mapper.serialize(&object)?)
                    });
                    match mapped {
                        Ok(text) => {
                            eprintln!("{} {}", "✅".green(), document.label);
                            lines.push(text);
                        }
                        Err(error) => {
                            failures += 1;
                            eprintln!("{} {}: {error:#}", "❌".red(), document.label.red());
                        }
                    }
                }

                let output = lines.join("\n");
                match target.out.as_ref() {
                    Some(out) => write_output(out, &output)?,
                    None if !output.is_empty() => println!("{output}"),
                    None => {}
                }

                if failures > 0 {
                    eprintln!("{}", format!("{failures} document(s) failed").red().bold());
                    return Ok(ExitCode::FAILURE);
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn describe_field(field: &FieldMetadata) -> Value {
    let annotations = &field.annotations;
    json!({
        "name": field.name,
        "key": field.key(),
        "type": field.declared.as_ref().map(|d| d.name()),
        "nullable": field.nullable,
        "ignore": annotations.is_ignored(),
        "element_type": annotations.property_type.as_ref().map(|t| t.name()),
        "date_format": annotations.date_time_format.as_ref().map(|f| f.format()),
    })
}

fn write_output(out: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
