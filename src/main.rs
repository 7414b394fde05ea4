//! Trellis CLI - Declarative Configuration Engine
//!
//! A demonstration CLI compiling TOML files against a small service
//! extension.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use trellis::prelude::*;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if let Err(err) = run(&args) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let program = args.first().map(String::as_str).unwrap_or("trellis");
    let (args, config_path) = split_config_flag(args)?;
    let config = match config_path {
        Some(path) => EngineConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    init_logging(&config);

    match args.get(1).map(String::as_str) {
        Some("sections") => list_sections(),
        Some("order") => show_order(&config),
        Some("check") => {
            let Some(path) = args.get(2).filter(|a| !a.starts_with("--")) else {
                bail!("please specify a configuration file");
            };
            check_file(Path::new(path), config)
        }
        Some("help" | "--help" | "-h") => {
            print_usage(program);
            Ok(())
        }
        Some(other) => {
            print_usage(program);
            bail!("unknown command: {}", other)
        }
        None => {
            print_usage(program);
            Ok(())
        }
    }
}

fn init_logging(config: &EngineConfig) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();
}

/// Remove `--config <path>` from the arguments, wherever it appears.
fn split_config_flag(args: &[String]) -> Result<(Vec<String>, Option<PathBuf>)> {
    let mut rest = Vec::with_capacity(args.len());
    let mut config = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let Some(path) = iter.next() else {
                bail!("--config needs a file argument");
            };
            config = Some(PathBuf::from(path));
        } else {
            rest.push(arg.clone());
        }
    }
    Ok((rest, config))
}

fn print_usage(program: &str) {
    println!("Trellis v{}", trellis::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  sections              List the sections of the demo extension");
    println!("  order                 Show the transform order");
    println!("  check <file.toml>     Compile a configuration file and print the result");
    println!("  help                  Show this help message");
    println!();
    println!("Options:");
    println!("  --config <file.toml>  Engine configuration");
}

fn list_sections() -> Result<()> {
    let extension = demo::extension();
    println!("{}:", extension.name);
    for section in &extension.sections {
        print_section(section, 1);
    }
    Ok(())
}

fn print_section(section: &Section, depth: usize) {
    let indent = "  ".repeat(depth);
    println!(
        "{}[{}] {}",
        indent,
        section.name,
        section.describe.as_deref().unwrap_or("")
    );
    for (name, spec) in &section.schema {
        println!("{}  {} : {}", indent, name, spec.option_type);
    }
    for entity in &section.entities {
        print_entity(entity, depth + 1);
    }
    for nested in &section.sections {
        print_section(nested, depth + 1);
    }
}

fn print_entity(entity: &EntityDef, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{}{} ({})", indent, entity.name, entity.target);
    for (name, spec) in &entity.schema {
        let marker = if spec.required { " (required)" } else { "" };
        println!("{}  {} : {}{}", indent, name, spec.option_type, marker);
    }
    for children in entity.entities.values() {
        for child in children {
            print_entity(child, depth + 1);
        }
    }
}

fn show_order(config: &EngineConfig) -> Result<()> {
    let compiler = Compiler::new(vec![demo::extension()]).with_config(config.clone());
    let pipeline = compiler.pipeline()?;
    for (i, name) in pipeline.order().iter().enumerate() {
        println!("{:>2}. {}", i + 1, name);
    }
    Ok(())
}

fn check_file(path: &Path, config: EngineConfig) -> Result<()> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let extension = demo::extension();
    let input = DslInput::from_toml_str(&src, std::slice::from_ref(&extension))?;

    let compiler = Compiler::new(vec![extension])
        .with_config(config)
        .with_progress(|event| {
            if let PipelineEvent::PassCompleted { name, duration_ms, .. } = event {
                log::debug!("{} finished in {}ms", name, duration_ms);
            }
        });
    let artifact = compiler.compile(&input)?;

    for warning in &artifact.warnings {
        eprintln!("warning [{}]: {}", warning.transform, warning.message);
    }
    println!("{}", serde_json::to_string_pretty(&artifact)?);
    Ok(())
}

mod demo {
    //! The demo `service` extension.

    use trellis::prelude::*;

    pub fn extension() -> Extension {
        let header = EntityDef::new("header", "Demo.Header")
            .option("name", OptionSpec::new(Type::String).required())
            .option("value", OptionSpec::new(Type::String).with_default(""))
            .with_args(["name"])
            .with_identifier("name");

        let endpoint = EntityDef::new("endpoint", "Demo.Endpoint")
            .option(
                "path",
                OptionSpec::new(Type::String)
                    .required()
                    .with_doc("Request path, relative to the service root"),
            )
            .option(
                "method",
                OptionSpec::new(Type::one_of_atoms(["get", "post", "put", "delete"]))
                    .with_default(Value::atom("get")),
            )
            .option(
                "timeout",
                OptionSpec::new(Type::Timeout).with_default(5000i64),
            )
            .option("tags", OptionSpec::new(Type::wrap_list(Type::Atom)))
            .with_args(["path"])
            .with_identifier("path")
            .nested("headers", header)
            .with_describe("An HTTP endpoint");

        Extension::new("Demo.Service")
            .with_section(
                Section::new("service")
                    .option("name", OptionSpec::new(Type::String).required())
                    .option("port", OptionSpec::new(Type::PosInteger).with_default(4000i64))
                    .option(
                        "mode",
                        OptionSpec::new(Type::one_of_atoms(["dev", "prod"]))
                            .with_default(Value::atom("dev")),
                    )
                    .with_entity(endpoint)
                    .with_describe("A service and its endpoints"),
            )
            .with_transform(FnTransformer::new("normalize_paths", normalize_paths))
            .with_transform(
                FnTransformer::new("count_endpoints", count_endpoints).runs_after("normalize_paths"),
            )
    }

    fn normalize_paths(state: &DslState) -> TransformResult {
        let endpoints = state.get_entities(&["service"]);
        if endpoints
            .iter()
            .all(|e| e.get("path").and_then(Value::as_string).map_or(true, |p| p.starts_with('/')))
        {
            return TransformResult::Unchanged;
        }

        let mut next = state.clone();
        for endpoint in endpoints {
            let Some(path) = endpoint.get("path").and_then(Value::as_string) else {
                continue;
            };
            if path.starts_with('/') {
                continue;
            }
            let normalized = format!("/{}", path);
            let mut replacement = endpoint.clone().with_option("path", normalized.as_str());
            replacement.identifier = Some(Value::string(normalized.as_str()));
            next = next.replace_entity(&["service"], replacement, |e| e == endpoint);
        }
        TransformResult::Warn(next, vec!["prefixed relative endpoint paths with /".to_string()])
    }

    fn count_endpoints(state: &DslState) -> TransformResult {
        let count = state.get_entities(&["service"]).len() as i64;
        TransformResult::Updated(state.clone().persist("endpoint_count", Value::Integer(count)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_config_flag_before_command() {
        let (rest, config) =
            split_config_flag(&args(&["trellis", "--config", "engine.toml", "check", "app.toml"]))
                .unwrap();
        assert_eq!(rest, args(&["trellis", "check", "app.toml"]));
        assert_eq!(config, Some(PathBuf::from("engine.toml")));
    }

    #[test]
    fn test_config_flag_after_command() {
        let (rest, config) =
            split_config_flag(&args(&["trellis", "order", "--config", "engine.toml"])).unwrap();
        assert_eq!(rest, args(&["trellis", "order"]));
        assert_eq!(config, Some(PathBuf::from("engine.toml")));
    }

    #[test]
    fn test_config_flag_without_path() {
        assert!(split_config_flag(&args(&["trellis", "check", "--config"])).is_err());

        let (rest, config) = split_config_flag(&args(&["trellis", "sections"])).unwrap();
        assert_eq!(rest, args(&["trellis", "sections"]));
        assert!(config.is_none());
    }

    #[test]
    fn test_demo_extension_compiles_endpoints() {
        let extension = demo::extension();
        let input = DslInput::from_toml_str(
            "[service]\nname = \"api\"\n\n[[service.endpoint]]\npath = \"users\"\n",
            std::slice::from_ref(&extension),
        )
        .unwrap();
        let artifact = Compiler::new(vec![extension]).compile(&input).unwrap();

        assert_eq!(
            artifact.state.get_entities(&["service"])[0].get("path"),
            Some(&Value::string("/users"))
        );
        assert_eq!(artifact.state.fetch_persisted("endpoint_count"), Some(&Value::Integer(1)));
        assert_eq!(artifact.warnings.len(), 1);
    }
}
