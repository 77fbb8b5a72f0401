//! LinkPure CLI
//!
//! Resolve URLs against the rule chain, watch a stream of clipboard
//! contents, manage user rules and check or merge shared rule catalogs.

mod config;
mod ids;
mod logging;
mod watch;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use lp_catalog::{
    convert_clearurls, convert_linkumori, merge_sources, verify, Catalog, RuleStore,
};
use lp_core::{resolve, ChainOptions, Rule, RuleSet, UserRule};

use crate::config::Config;
use crate::watch::Watcher;

#[derive(Parser)]
#[command(name = "linkpure")]
#[command(about = "Rewrite links by chaining user and shared URL rules")]
struct Cli {
    /// Config file (default: ~/.config/linkpure/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// User rule store, overriding the config file
    #[arg(long = "rules", global = true, value_name = "FILE")]
    rules_file: Option<PathBuf>,

    /// Shared catalog replacing the bundled one
    #[arg(long = "catalog", global = true, value_name = "FILE")]
    catalog_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a URL through the rule chain
    Resolve {
        url: String,

        /// Maximum rewrites before the chain is declared infinite
        #[arg(long)]
        max_redirects: Option<i32>,

        /// Use only the user rules
        #[arg(long)]
        no_shared: bool,

        /// Print the chain result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite URLs read line by line from stdin
    Watch {
        /// Maximum rewrites before the chain is declared infinite
        #[arg(long)]
        max_redirects: Option<i32>,
    },

    /// Manage user rules
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },

    /// Inspect, check and merge shared rule catalogs
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Subcommand)]
enum RulesCommand {
    /// List user rules in priority order
    List,

    /// Add a rule ahead of all existing rules
    Add {
        /// Filter regex
        from: String,
        /// Substitution template ($1, $2, ...); empty means none
        #[arg(default_value = "")]
        to: String,
        /// Rule id (default: a freshly generated ULID)
        #[arg(long)]
        id: Option<String>,
        /// Store the rule disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Change a rule's filter or substitution
    Update {
        id: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },

    /// Delete a rule
    Remove { id: String },

    /// Enable a rule
    Enable { id: String },

    /// Disable a rule
    Disable { id: String },

    /// Import rules from a JSON array, ahead of existing rules
    Import {
        /// Rules file as written by `rules export`
        file: PathBuf,
    },

    /// Write all rules as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// Show catalog summary
    Info,

    /// Validate patterns and run every bundled test case
    Check,

    /// Merge catalog sources, first definition of an id wins
    Merge {
        /// Source catalogs in priority order
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Append the bundled catalog as the lowest-priority source
        #[arg(long)]
        with_bundled: bool,

        /// Output catalog file
        #[arg(short, long, default_value = "shared-rules.json")]
        output: PathBuf,
    },

    /// Convert an upstream rule list into a catalog
    Convert {
        /// Upstream format
        #[arg(value_enum)]
        format: SourceFormat,

        /// Upstream rule file
        input: PathBuf,

        /// Output catalog file
        #[arg(short, long, default_value = "shared-rules.json")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceFormat {
    /// ClearURLs data.min.json
    Clearurls,
    /// Linkumori parameter rules
    Linkumori,
}

/// Config file merged with command-line overrides.
struct Settings {
    config: Config,
    rules_path: PathBuf,
    catalog_path: Option<PathBuf>,
}

impl Settings {
    fn load(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        let rules_path = match &cli.rules_file {
            Some(path) => path.clone(),
            None => config.rules_path()?,
        };
        let catalog_path = cli.catalog_file.clone().or_else(|| config.catalog_path.clone());
        Ok(Self {
            config,
            rules_path,
            catalog_path,
        })
    }

    fn options(&self, max_redirects: Option<i32>) -> ChainOptions {
        ChainOptions::with_max_redirects(max_redirects.unwrap_or(self.config.max_redirects))
    }

    fn store(&self) -> Result<RuleStore> {
        Ok(RuleStore::open(&self.rules_path)?)
    }

    fn catalog(&self) -> Result<Catalog> {
        Ok(Catalog::load(self.catalog_path.as_deref())?)
    }

    /// User rules, then the shared catalog when enabled.
    fn rule_set(&self, use_shared: bool) -> Result<RuleSet> {
        let store = self.store()?;
        for rule in store.enabled_rules() {
            if let Err(e) = Rule::from(rule.clone()).validate() {
                tracing::warn!("user rule '{}' will never match: {}", rule.id, e);
            }
        }

        let shared = if use_shared && self.config.use_shared_rules {
            self.catalog()?.rules
        } else {
            Vec::new()
        };
        Ok(RuleSet::assemble(store.rules(), &shared))
    }
}

fn main() {
    logging::init_logging();
    let cli = Cli::parse();

    let result = Settings::load(&cli).and_then(|settings| match cli.command {
        Commands::Resolve {
            url,
            max_redirects,
            no_shared,
            json,
        } => cmd_resolve(&settings, &url, max_redirects, no_shared, json),
        Commands::Watch { max_redirects } => cmd_watch(&settings, max_redirects),
        Commands::Rules { command } => cmd_rules(&settings, command),
        Commands::Catalog { command } => cmd_catalog(&settings, command),
    });

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_resolve(
    settings: &Settings,
    url: &str,
    max_redirects: Option<i32>,
    no_shared: bool,
    json: bool,
) -> Result<()> {
    let rules = settings.rule_set(!no_shared)?;
    let options = settings.options(max_redirects);

    let start = Instant::now();
    let result = resolve(&rules, url, &options);
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Status:  {}", result.status);
    println!("Input:   {}", url);
    for (step, hop) in result.urls.iter().enumerate() {
        println!("  [{}] {}", step + 1, hop);
    }
    if let Some(final_url) = result.final_url() {
        println!("Result:  {}", final_url);
    }
    println!(
        "Rules:   {} (budget {}, {:.3}ms)",
        rules.len(),
        options.effective_budget(),
        elapsed.as_secs_f64() * 1000.0
    );
    Ok(())
}

fn cmd_watch(settings: &Settings, max_redirects: Option<i32>) -> Result<()> {
    let rules = settings.rule_set(true)?;
    if rules.is_empty() {
        tracing::info!("no rules configured, input is passed through unchanged");
    }

    let options = settings.options(max_redirects);
    let mut watcher = Watcher::new(&rules, options, settings.config.notification_enabled);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stats = watcher.run(stdin.lock(), stdout.lock())?;
    tracing::info!(
        "watch finished: {} line(s), {} URL(s), {} rewritten",
        stats.lines,
        stats.urls,
        stats.rewritten
    );
    Ok(())
}

fn cmd_rules(settings: &Settings, command: RulesCommand) -> Result<()> {
    let mut store = settings.store()?;

    match command {
        RulesCommand::List => {
            if store.rules().is_empty() {
                println!("No rules in '{}'", store.path().display());
            }
            for rule in store.rules() {
                let mark = if rule.enabled { "x" } else { " " };
                if rule.to.is_empty() {
                    println!("[{}] {}  {}", mark, rule.id, rule.from);
                } else {
                    println!("[{}] {}  {} -> {}", mark, rule.id, rule.from, rule.to);
                }
            }
        }
        RulesCommand::Add {
            from,
            to,
            id,
            disabled,
        } => {
            let rule = UserRule {
                id: id.unwrap_or_else(ids::new_rule_id),
                from,
                to,
                enabled: !disabled,
            };
            warn_if_invalid(&rule);
            let id = rule.id.clone();
            store.add(rule)?;
            println!("Added rule '{}'", id);
        }
        RulesCommand::Update { id, from, to } => {
            let mut rule = store
                .get(&id)
                .cloned()
                .with_context(|| format!("no rule with id '{id}'"))?;
            if from.is_none() && to.is_none() {
                bail!("nothing to update, pass --from and/or --to");
            }
            if let Some(from) = from {
                rule.from = from;
            }
            if let Some(to) = to {
                rule.to = to;
            }
            warn_if_invalid(&rule);
            store.update(rule)?;
            println!("Updated rule '{}'", id);
        }
        RulesCommand::Remove { id } => {
            store.remove(&id)?;
            println!("Removed rule '{}'", id);
        }
        RulesCommand::Enable { id } => {
            store.set_enabled(&id, true)?;
            println!("Enabled rule '{}'", id);
        }
        RulesCommand::Disable { id } => {
            store.set_enabled(&id, false)?;
            println!("Disabled rule '{}'", id);
        }
        RulesCommand::Import { file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read '{}'", file.display()))?;
            let count = store.import_json(&text, ids::new_rule_id)?;
            println!("Imported {} rule(s) from '{}'", count, file.display());
        }
        RulesCommand::Export { output } => {
            let json = store.export_json()?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("failed to write '{}'", path.display()))?;
                    println!("Exported {} rule(s) to '{}'", store.rules().len(), path.display());
                }
                None => print!("{json}"),
            }
        }
    }

    Ok(())
}

fn warn_if_invalid(rule: &UserRule) {
    if let Err(e) = Rule::from(rule.clone()).validate() {
        tracing::warn!("rule '{}' is stored but will never match: {}", rule.id, e);
    }
}

fn cmd_catalog(settings: &Settings, command: CatalogCommand) -> Result<()> {
    match command {
        CatalogCommand::Info => cmd_catalog_info(&settings.catalog()?),
        CatalogCommand::Check => cmd_catalog_check(&settings.catalog()?, &settings.options(None)),
        CatalogCommand::Merge {
            input,
            with_bundled,
            output,
        } => cmd_catalog_merge(&input, with_bundled, &output),
        CatalogCommand::Convert {
            format,
            input,
            output,
        } => cmd_catalog_convert(format, &input, &output),
    }
}

fn cmd_catalog_info(catalog: &Catalog) -> Result<()> {
    let substituting = catalog
        .rules
        .iter()
        .filter(|r| r.regex_substitution.is_some())
        .count();

    println!("Catalog: {}", catalog.name);
    if !catalog.description.is_empty() {
        println!("  {}", catalog.description);
    }
    println!("  Rules:       {}", catalog.rules.len());
    println!("  Substitute:  {}", substituting);
    println!("  Strip:       {}", catalog.rules.len() - substituting);
    println!("  Test cases:  {}", catalog.test_case_count());
    Ok(())
}

fn cmd_catalog_check(catalog: &Catalog, options: &ChainOptions) -> Result<()> {
    let mut invalid = 0usize;
    for rule in &catalog.rules {
        if let Err(e) = Rule::from(rule.clone()).validate() {
            println!("INVALID {}: {}", rule.id, e);
            invalid += 1;
        }
    }

    let failures = verify(catalog, options);
    for failure in &failures {
        println!("FAIL {}", failure);
    }

    let total = catalog.test_case_count();
    println!(
        "Checked {} rules, {} test cases: {} invalid, {} failed",
        catalog.rules.len(),
        total,
        invalid,
        failures.len()
    );

    if invalid > 0 || !failures.is_empty() {
        bail!("catalog '{}' did not pass", catalog.name);
    }
    Ok(())
}

fn cmd_catalog_merge(inputs: &[PathBuf], with_bundled: bool, output: &Path) -> Result<()> {
    let mut sources = inputs
        .iter()
        .map(|path| Catalog::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;
    if with_bundled {
        sources.push(Catalog::bundled());
    }

    let (merged, stats) = merge_sources(&sources);
    fs::write(output, merged.to_json()?)
        .with_context(|| format!("failed to write '{}'", output.display()))?;

    println!("Merged {} sources to '{}'", sources.len(), output.display());
    for (i, count) in stats.per_source.iter().enumerate() {
        let name = inputs
            .get(i)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(bundled)".to_string());
        println!("  [{}] {} - {} rules", i, name, count);
    }
    println!(
        "  Rules:    {} -> {} (duplicates skipped {})",
        stats.before,
        stats.after,
        stats.duplicates.len()
    );
    Ok(())
}

fn cmd_catalog_convert(format: SourceFormat, input: &Path, output: &Path) -> Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    let catalog = match format {
        SourceFormat::Clearurls => convert_clearurls(&text)?,
        SourceFormat::Linkumori => convert_linkumori(&text)?,
    };

    let invalid = catalog
        .rules
        .iter()
        .filter(|rule| Rule::from((*rule).clone()).validate().is_err())
        .count();
    fs::write(output, catalog.to_json()?)
        .with_context(|| format!("failed to write '{}'", output.display()))?;

    println!("Converted '{}' to '{}'", input.display(), output.display());
    println!("  Catalog:  {}", catalog.name);
    println!("  Rules:    {} ({} with invalid patterns)", catalog.rules.len(), invalid);
    Ok(())
}
