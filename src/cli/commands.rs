//! Command dispatch

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::application::render::{to_termtrees, EventView, RenderStyle};
use crate::application::roster;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path};
use crate::domain::{PersonRecord, TreeFlattener};
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute_command(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `kintree --help`".to_string(),
        ));
    };

    match command {
        Commands::Tree { from, ids } => cmd_tree(cli, container, from.as_deref(), *ids),
        Commands::Events { json } => cmd_events(cli, container, *json),
        Commands::List { search } => cmd_list(cli, container, search.as_deref()),
        Commands::Stats => cmd_stats(cli, container),
        Commands::Tags => cmd_tags(cli, container),
        Commands::NextTag { spouse } => cmd_next_tag(cli, container, spouse.as_deref()),
        Commands::NextId => cmd_next_id(cli, container),
        Commands::Parents => cmd_parents(cli, container),
        Commands::Show { id } => cmd_show(cli, container, id),
        Commands::Check => cmd_check(cli, container),
        Commands::Config { command } => cmd_config(cli, container, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn project_dir(cli: &Cli) -> Option<PathBuf> {
    cli.project_dir
        .clone()
        .or_else(|| std::env::current_dir().ok())
}

fn data_path(cli: &Cli, container: &ServiceContainer) -> PathBuf {
    cli.file.clone().unwrap_or_else(|| {
        container
            .settings
            .data_path(project_dir(cli).as_deref())
    })
}

fn require_id(id: &str) -> CliResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CliError::InvalidArgs("person id must not be empty".to_string()));
    }
    Ok(id)
}

fn load_records(cli: &Cli, container: &ServiceContainer) -> CliResult<Vec<PersonRecord>> {
    let path = data_path(cli, container);
    debug!("loading family data from {}", path.display());
    Ok(container.family.load_snapshot(&path)?)
}

#[instrument(skip(cli, container))]
fn cmd_tree(
    cli: &Cli,
    container: &ServiceContainer,
    from: Option<&str>,
    ids: bool,
) -> CliResult<()> {
    let records = load_records(cli, container)?;
    let forest = container.family.build_forest(&records);

    let flattener = match from {
        Some(id) => {
            let id = require_id(id)?;
            let idx = forest
                .index_of(id)
                .ok_or_else(|| ApplicationError::PersonNotFound(id.to_string()))?;
            TreeFlattener::from_roots(&forest, &[idx])
        }
        None => forest.flatten(),
    };

    let style = RenderStyle {
        show_ids: ids || container.settings.show_ids,
        spouse_separator: container.settings.spouse_separator.clone(),
    };
    let trees = to_termtrees(flattener, &style);
    if trees.is_empty() {
        output::warning("No family tree data available");
        return Ok(());
    }
    for tree in trees {
        output::info(&tree);
    }
    Ok(())
}

#[instrument(skip(cli, container))]
fn cmd_events(cli: &Cli, container: &ServiceContainer, json: bool) -> CliResult<()> {
    let records = load_records(cli, container)?;
    let forest = container.family.build_forest(&records);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for event in forest.flatten() {
        let view = EventView::from(event);
        if json {
            serde_json::to_writer(&mut out, &view)
                .map_err(|e| InfraError::io("write event", e.into()))?;
            writeln!(out).map_err(|e| InfraError::io("write event", e))?;
        } else {
            writeln!(out, "{}", view).map_err(|e| InfraError::io("write event", e))?;
        }
    }
    Ok(())
}

fn cmd_list(cli: &Cli, container: &ServiceContainer, search: Option<&str>) -> CliResult<()> {
    let records = load_records(cli, container)?;
    let people = match search {
        Some(query) => roster::search(&records, query),
        None => roster::complete_people(&records),
    };
    if people.is_empty() {
        match search {
            Some(query) => output::warning(&format!("No family members matching '{}'", query)),
            None => output::warning("No family members yet"),
        }
        return Ok(());
    }
    for person in people {
        let gender = person.gender.as_deref().unwrap_or("Not specified");
        output::info(&format!("{:>4}  {} ({})", person.id, person.display_name(), gender));
        for (label, value) in [
            ("Address", &person.address),
            ("Occupation", &person.occupation),
            ("Education", &person.education),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                output::detail(&format!("{}: {}", label, value));
            }
        }
    }
    Ok(())
}

fn cmd_stats(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let records = load_records(cli, container)?;
    let stats = roster::stats(&records);
    output::field("Total Members", &stats.total);
    output::field("Male", &stats.male);
    output::field("Female", &stats.female);
    Ok(())
}

fn cmd_tags(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let records = load_records(cli, container)?;
    for tag in roster::all_tags(&records) {
        output::info(tag);
    }
    Ok(())
}

fn cmd_next_tag(cli: &Cli, container: &ServiceContainer, spouse: Option<&str>) -> CliResult<()> {
    let records = load_records(cli, container)?;
    let prefix = &container.settings.tag_prefix;
    let tag = match spouse {
        Some(id) => {
            let id = require_id(id)?;
            container.family.find_person(&records, id)?;
            roster::tag_for_new_spouse(&records, id, prefix)
        }
        None => roster::next_marriage_tag(&records, prefix),
    };
    output::info(&tag);
    Ok(())
}

fn cmd_next_id(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let records = load_records(cli, container)?;
    output::info(&roster::next_person_id(&records));
    Ok(())
}

fn cmd_parents(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let records = load_records(cli, container)?;
    for choice in roster::parent_choices(&records) {
        output::info(&format!(
            "{}\t{} ({})",
            choice.id,
            choice.name.unwrap_or("Unknown"),
            choice.gender.unwrap_or("?")
        ));
    }
    Ok(())
}

fn cmd_show(cli: &Cli, container: &ServiceContainer, id: &str) -> CliResult<()> {
    let id = require_id(id)?;
    let records = load_records(cli, container)?;
    let person = container.family.find_person(&records, id)?;
    let forest = container.family.build_forest(&records);

    output::header(person.display_name());
    output::field("Id", &person.id);
    let optional = [
        ("Gender", &person.gender),
        ("Parent", &person.parent_id),
        ("Image", &person.image_path),
        ("Address", &person.address),
        ("Occupation", &person.occupation),
        ("Education", &person.education),
    ];
    for (label, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            output::field(label, value);
        }
    }
    if let Some(tag) = person.marriage_tag() {
        output::field("Marriage tag", tag);
    }
    if let Some(node) = forest.node(id) {
        let partners: Vec<String> = forest
            .spouse_of(node)
            .into_iter()
            .chain(forest.spouses_of(node))
            .map(|n| n.to_string())
            .collect();
        if !partners.is_empty() {
            output::field("Spouse", &partners.join(", "));
        }
        let children: Vec<String> = forest.children_of(node).map(|n| n.to_string()).collect();
        if !children.is_empty() {
            output::field("Children", &children.join(", "));
        }
    }
    Ok(())
}

fn cmd_check(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let records = load_records(cli, container)?;
    let forest = container.family.build_forest(&records);

    let incomplete = records.iter().filter(|r| !r.is_complete()).count();
    if incomplete > 0 {
        output::warning(&format!(
            "{} incomplete record(s): kept in the tree, left out of list and stats",
            incomplete
        ));
    }
    if forest.diagnostics().is_empty() {
        output::success(&format!(
            "{} people, {} trees, {} generations",
            forest.len(),
            forest.roots().len(),
            forest.depth()
        ));
        return Ok(());
    }
    for diagnostic in forest.diagnostics() {
        output::warning(diagnostic);
    }
    Ok(())
}

fn cmd_config(cli: &Cli, container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".to_string());
            output::field("global", &global);
            if let Some(dir) = project_dir(cli) {
                let local = local_config_path(&dir);
                output::field("local", &with_status(container, &local));
            }
            output::field("data", &with_status(container, &data_path(cli, container)));
        }
    }
    Ok(())
}

fn with_status(container: &ServiceContainer, path: &Path) -> String {
    if container.fs.is_file(path) {
        path.display().to_string()
    } else if container.fs.exists(path) {
        format!("{} (not a file)", path.display())
    } else {
        format!("{} (missing)", path.display())
    }
}
