//! Interactive shell for debugging completed BDI agent traces.
//!
//! The shell only renders state snapshots and "next node to judge" prompts
//! and feeds oracle verdicts (from stdin) back into the core protocols; all
//! reconstruction and search logic lives in the library.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use debugger::config::{DebuggerConfig, load_config};
use debugger::debug::{GoalTree, Judgment, LocalizeOutcome, Localizer, Navigator, Verdict};
use debugger::exit_codes;
use debugger::ingest::AgentRepository;
use debugger::model::AgentTrace;
use debugger::state::{diff, state_at};

#[derive(Parser)]
#[command(
    name = "debugger",
    version,
    about = "Algorithmic debugger for completed BDI agent traces"
)]
struct Cli {
    /// TOML config file (defaults to ./debugger.toml, all-defaults if absent).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Folder holding agent `*.log` traces; overrides the config file.
    #[arg(short, long, global = true)]
    folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List agents with a trace in the log folder.
    Agents,
    /// Print an agent's plan library with usage counts.
    Plans { agent: String },
    /// Reconstruct beliefs and active goals at a cycle.
    State { agent: String, cycle: u64 },
    /// Show what changed between two cycles.
    Diff { agent: String, from: u64, to: u64 },
    /// Run an interactive debugging session over one goal tree.
    Debug {
        agent: String,
        /// Root goal-expansion id to debug.
        #[arg(long)]
        root: Option<u64>,
        /// Plan label whose instantiations are the candidate roots.
        #[arg(long)]
        plan: Option<String>,
    },
}

fn main() {
    debugger::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("debugger.toml"));
    let config = load_config(&config_path)?;
    let folder = cli
        .folder
        .clone()
        .or_else(|| config.log_folder.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let repo = AgentRepository::new(folder);

    match cli.command {
        Command::Agents => cmd_agents(&repo),
        Command::Plans { agent } => cmd_plans(&repo, &agent),
        Command::State { agent, cycle } => cmd_state(&repo, &config, &agent, cycle),
        Command::Diff { agent, from, to } => cmd_diff(&repo, &agent, from, to),
        Command::Debug { agent, root, plan } => cmd_debug(&repo, &config, &agent, root, plan),
    }
}

fn cmd_agents(repo: &AgentRepository) -> Result<i32> {
    let agents = repo
        .agents()
        .with_context(|| format!("list agents in {}", repo.folder().display()))?;
    for agent in agents {
        println!("{agent}");
    }
    Ok(exit_codes::OK)
}

fn cmd_plans(repo: &AgentRepository, agent: &str) -> Result<i32> {
    let trace = repo.load(agent)?;
    for plan in trace.plans() {
        println!(
            "{}: {} : {} (used {}x) [{}:{}]",
            plan.label, plan.trigger, plan.context, plan.used, plan.file, plan.line
        );
    }
    Ok(exit_codes::OK)
}

fn cmd_state(
    repo: &AgentRepository,
    config: &DebuggerConfig,
    agent: &str,
    cycle: u64,
) -> Result<i32> {
    let trace = repo.load(agent)?;
    let state = state_at(&trace, cycle)?;

    println!("state of {agent} at cycle {cycle}");
    println!("beliefs ({}):", state.beliefs.len());
    for belief in state.beliefs.iter().take(config.max_displayed_beliefs) {
        println!("  {belief}");
    }
    if state.beliefs.len() > config.max_displayed_beliefs {
        println!(
            "  ... {} more",
            state.beliefs.len() - config.max_displayed_beliefs
        );
    }
    println!("active intentions: {:?}", state.active_intentions);
    println!("active goal-expansions:");
    for &id in &state.active_expansions {
        if let Some(expansion) = trace.expansion(id) {
            println!("  {id}: {} (plan {})", expansion.trigger, expansion.plan);
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_diff(repo: &AgentRepository, agent: &str, from: u64, to: u64) -> Result<i32> {
    let trace = repo.load(agent)?;
    let diff = diff(&trace, from, to)?;

    println!("diff of {agent} between cycles {from} and {to}");
    for belief in &diff.beliefs_added {
        println!("  +{belief}");
    }
    for belief in &diff.beliefs_removed {
        println!("  -{belief}");
    }
    println!("expansions started: {:?}", diff.expansions_started);
    println!("expansions finished: {:?}", diff.expansions_finished);
    Ok(exit_codes::OK)
}

fn cmd_debug(
    repo: &AgentRepository,
    config: &DebuggerConfig,
    agent: &str,
    root: Option<u64>,
    plan: Option<String>,
) -> Result<i32> {
    let trace = repo.load(agent)?;
    let root = resolve_root(&trace, root, plan.as_deref())?;
    let tree = GoalTree::build(&trace, root)?;

    println!("goal tree under {}:", tree.node(tree.root()).label);
    for (id, depth) in tree.traverse() {
        println!("{}{}", "  ".repeat(depth + 1), tree.node(id).label);
    }

    let stdin = io::stdin();
    let mut oracle = stdin.lock();
    let mut nav = Navigator::new(tree);
    while let Some(node) = nav.next()? {
        let label = nav.tree().node(node).label.clone();
        let verdict = ask(
            &mut oracle,
            &format!("did {label} behave as expected? [v]alid / [i]nvalid: "),
            &['v', 'i'],
        )?;
        let judgment = if verdict == 'v' {
            Judgment::Valid
        } else {
            Judgment::Invalid
        };
        nav.mark(node, judgment)?;
    }

    let Some(bug) = nav.final_bug() else {
        println!("no bug found in this tree; try another root goal if one exists");
        return Ok(exit_codes::NO_BUG);
    };

    let expansion_id = nav.tree().node(bug).expansion;
    let expansion = trace
        .expansion(expansion_id)
        .context("bug node mirrors a trace expansion")?;
    println!(
        "faulty goal-expansion: {} (plan {}, {}:{})",
        expansion.trigger, expansion.plan, expansion.file, expansion.line
    );
    if let Some(failure) = &expansion.failure {
        println!("  recorded failure: {} ({})", failure.message, failure.kind);
    }

    localize(&trace, config, expansion_id, &mut oracle)
}

fn localize(
    trace: &AgentTrace,
    config: &DebuggerConfig,
    expansion: u64,
    oracle: &mut impl BufRead,
) -> Result<i32> {
    let mut localizer =
        Localizer::with_auto_trust(trace, expansion, config.auto_trust_goal_instructions)?;

    loop {
        let prompt = match localizer.next()? {
            Some(prompt) => prompt.clone(),
            None => break,
        };
        println!(
            "instruction at {}:{} (cycle {}): {}",
            prompt.instruction.file, prompt.instruction.line, prompt.instruction.cycle,
            prompt.instruction.text
        );
        if let Some(snapshot) = &prompt.snapshot {
            for belief in &snapshot.beliefs_added {
                println!("    added belief {belief}");
            }
            for belief in &snapshot.beliefs_removed {
                println!("    removed belief {belief}");
            }
        }
        if let Some(unifier) = &prompt.instruction.unifier {
            for (var, value) in unifier {
                println!("    {var} = {value}");
            }
        }
        let verdict = ask(oracle, "did it produce the expected result? [y/n]: ", &['y', 'n'])?;
        localizer.answer(if verdict == 'y' {
            Verdict::Expected
        } else {
            Verdict::Unexpected
        })?;
    }

    match localizer.outcome().context("localization concluded")? {
        LocalizeOutcome::Culprit(instruction) => {
            println!(
                "buggy instruction: {} at {}:{}",
                instruction.text, instruction.file, instruction.line
            );
        }
        LocalizeOutcome::Inconclusive(guidance) => {
            println!("no single buggy instruction identified; consider:");
            for item in guidance {
                println!("  - {}", item.describe());
            }
        }
    }
    Ok(exit_codes::OK)
}

fn resolve_root(trace: &AgentTrace, root: Option<u64>, plan: Option<&str>) -> Result<u64> {
    if let Some(root) = root {
        return Ok(root);
    }
    let Some(plan) = plan else {
        bail!("pass --root <expansion-id> or --plan <label> to choose the tree to debug");
    };
    let roots = GoalTree::roots_for_plan(trace, plan);
    match roots.as_slice() {
        [] => bail!("plan '{plan}' was never selected in this trace"),
        [only] => Ok(*only),
        many => bail!(
            "plan '{plan}' has several instantiations, pick one with --root: {many:?}"
        ),
    }
}

/// Ask the oracle one single-character question, retrying until an accepted
/// answer arrives. EOF on stdin aborts the session.
fn ask(oracle: &mut impl BufRead, prompt: &str, accepted: &[char]) -> Result<char> {
    loop {
        print!("{prompt}");
        io::stdout().flush().context("flush prompt")?;
        let mut line = String::new();
        let read = oracle.read_line(&mut line).context("read verdict")?;
        if read == 0 {
            bail!("oracle input ended before the session concluded");
        }
        if let Some(answer) = line.trim().chars().next().map(|c| c.to_ascii_lowercase())
            && accepted.contains(&answer)
        {
            return Ok(answer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_agents() {
        let cli = Cli::parse_from(["debugger", "agents"]);
        assert!(matches!(cli.command, Command::Agents));
    }

    #[test]
    fn parse_debug_with_root() {
        let cli = Cli::parse_from(["debugger", "debug", "bob", "--root", "100"]);
        match cli.command {
            Command::Debug { agent, root, plan } => {
                assert_eq!(agent, "bob");
                assert_eq!(root, Some(100));
                assert_eq!(plan, None);
            }
            _ => panic!("expected debug command"),
        }
    }

    #[test]
    fn parse_global_folder_flag() {
        let cli = Cli::parse_from(["debugger", "--folder", "/tmp/traces", "agents"]);
        assert_eq!(cli.folder, Some(PathBuf::from("/tmp/traces")));
    }

    #[test]
    fn ask_retries_until_accepted_answer() {
        let mut input = io::Cursor::new(b"maybe\nV\n".to_vec());
        let answer = ask(&mut input, "", &['v', 'i']).expect("answer");
        assert_eq!(answer, 'v');
    }

    #[test]
    fn ask_fails_on_eof() {
        let mut input = io::Cursor::new(Vec::new());
        let err = ask(&mut input, "", &['v']).expect_err("should fail");
        assert!(err.to_string().contains("oracle input ended"));
    }
}
