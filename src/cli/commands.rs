//! Command dispatch

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, instrument};

use crate::application::services::{cluster_counts, survey, HypothesisWalk, SearchSpace};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{build_tree, enumerate_partitions, expected_partition_count, ToTermTree};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if let Some(Commands::Completion { shell }) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?.with_overrides(&cli.overrides())?;
    debug!("settings: {:?}", settings);

    match &cli.command {
        Some(Commands::Tree) => _tree(&settings),
        Some(Commands::Enumerate { limit }) => _enumerate(&settings, limit.or(settings.limit)),
        Some(Commands::Count) => _count(&settings),
        Some(Commands::Best { top }) => _best(&settings, top.unwrap_or(settings.top)),
        Some(Commands::Survey {
            depths,
            branch_counts,
            split_nums,
        }) => _survey(&settings, depths, branch_counts, split_nums),
        Some(Commands::Walk {
            steps,
            prune_probability,
        }) => _walk(&settings, *steps, *prune_probability),
        Some(Commands::Config { command }) => _config(&settings, command),
        Some(Commands::Completion { .. }) | None => Ok(()),
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[instrument(skip(settings))]
fn _tree(settings: &Settings) -> CliResult<()> {
    let tree = build_tree(settings.depth, settings.branch_count);
    output::info(&tree.to_termtree());
    output::action("nodes", &tree.node_count());
    output::action("levels", &tree.depth());
    Ok(())
}

#[instrument(skip(settings))]
fn _enumerate(settings: &Settings, limit: Option<usize>) -> CliResult<()> {
    let tree = build_tree(settings.depth, settings.branch_count);
    let partitions = enumerate_partitions(&tree, tree.root(), settings.split_num);
    let mut shown = 0usize;
    for (num, partition) in partitions.enumerate() {
        if limit.is_some_and(|limit| num >= limit) {
            output::warning(&format!("stopped after {} partitions", num));
            return Ok(());
        }
        output::info(&format!("#{:>4}: {}", num, tree.names(&partition)));
        shown += 1;
    }
    output::action("partitions", &shown);
    Ok(())
}

#[instrument(skip(settings))]
fn _count(settings: &Settings) -> CliResult<()> {
    let tree = build_tree(settings.depth, settings.branch_count);
    let enumerated = enumerate_partitions(&tree, tree.root(), settings.split_num).count() as u128;
    let expected =
        expected_partition_count(settings.depth, settings.branch_count, settings.split_num);
    let msg = format!("enumerated {} partitions, recurrence gives {}", enumerated, expected);
    if enumerated == expected {
        output::success(&msg);
        Ok(())
    } else {
        output::failure(&msg);
        Err(CliError::CheckFailed(format!(
            "partition count mismatch for depth {} branch count {} split {}",
            settings.depth, settings.branch_count, settings.split_num
        )))
    }
}

#[instrument(skip(settings))]
fn _best(settings: &Settings, top: usize) -> CliResult<()> {
    let mut rng = make_rng(settings.seed);
    let space = SearchSpace::random(settings.depth, settings.branch_count, &mut rng);
    let (count, best) = space.scan(settings.split_num, top);
    output::header(&format!("best {} of {} partitions", best.len(), count));
    for scored in &best {
        output::detail(&format!(
            "[{}] {:.3}",
            space.tree().names(&scored.nodes),
            scored.score
        ));
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _survey(
    settings: &Settings,
    depths: &[usize],
    branch_counts: &[usize],
    split_nums: &[usize],
) -> CliResult<()> {
    if split_nums.contains(&0) {
        return Err(CliError::InvalidArgs("split arity must be at least 1".to_string()));
    }
    let mut rng = make_rng(settings.seed);
    output::header("depth branches split partitions best");
    for row in survey(depths, branch_counts, split_nums, &mut rng) {
        output::info(&format!(
            "{:>5} {:>8} {:>5} {:>10} {:.3} [{}]",
            row.depth,
            row.branch_count,
            row.split_num,
            row.partition_count,
            row.best_score,
            row.best_names
        ));
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _walk(settings: &Settings, steps: Option<usize>, prune_probability: Option<f64>) -> CliResult<()> {
    let mut walk_settings = settings.clone();
    if let Some(steps) = steps {
        walk_settings.walk.steps = steps;
    }
    if let Some(p) = prune_probability {
        walk_settings.walk.prune_probability = p;
    }
    let walk = HypothesisWalk::from_settings(&walk_settings)?;

    let tree = build_tree(settings.depth, settings.branch_count);
    let mut rng = make_rng(settings.seed);
    let trail = walk.run(&tree, &mut rng)?;

    for step in &trail {
        output::info(&format!(
            "{:>4} {:<5} {} (leaf splits {}, splittable nodes {})",
            step.step,
            step.kind,
            step.hypothesis.named(&tree),
            step.leaf_splits,
            step.splittable_nodes
        ));
    }

    output::header("most visited");
    for (hypothesis, count) in cluster_counts(trail.iter().map(|s| &s.hypothesis)).iter().take(5) {
        output::detail(&format!("{:>4} {}", count, hypothesis.named(&tree)));
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _config(settings: &Settings, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no config directory available on this platform"),
        },
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
