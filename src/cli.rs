use std::env;

use anyhow::Result;
use clap::{ArgAction, Parser};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use indoc::indoc;
use log::LevelFilter;

use crate::app::RepoContext;
use crate::grammar::Grammar;
use crate::{environment, paths, pipeline, submodule};

const AFTER_HELP: &str = indoc! {"
    Examples:
      add-grammar https://github.com/atom/language-ruby
      add-grammar --replace language-ruby https://github.com/org/better-ruby.git
      add-grammar -q -rvendor/grammars/Sublime-Pascal https://github.com/org/pascal

    The grammar is added as a submodule under vendor/grammars/, then the grammar
    compiler, license cache, samples, submodule list and grammar list are
    refreshed. Run from anywhere inside the repository.
"};

/// Register a grammar repository as a submodule under vendor/grammars
#[derive(Parser, Debug)]
#[command(disable_help_flag = true, after_help = AFTER_HELP)]
pub struct Cli {
    /// Print help
    #[arg(short = 'h', long = "help", short_alias = '?', action = ArgAction::Help)]
    _help: Option<bool>,

    /// Remove this grammar submodule (name or vendor path) before adding the new one
    #[arg(short = 'r', long = "replace", value_name = "SUBMODULE")]
    pub replace: Option<String>,

    /// Container engine the grammar compiler runs under
    #[arg(long, env = "CONTAINER_TOOL", default_value = "docker")]
    pub container_tool: String,

    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// URL of the grammar repository
    #[arg(value_name = "URL")]
    pub url: String,
}

impl Cli {
    pub fn quiet(&self) -> bool {
        self.verbose.log_level_filter() < LevelFilter::Info
    }

    pub fn exec(self) -> Result<()> {
        environment::check_tools(&self.container_tool)?;
        environment::check_container_engine(&self.container_tool)?;

        let cwd = env::current_dir()?;
        let root = paths::find_repo_root(&cwd)?;
        if dunce::canonicalize(&cwd)? != root {
            info!("Working from repository root {}", root.display());
        }
        let context = RepoContext::new(root, self.quiet());

        let grammar = Grammar::resolve(&context, &self.url)?;
        grammar.ensure_absent(&context)?;

        let replaced = match &self.replace {
            Some(target) => Some(submodule::remove(&context, target)?),
            None => None,
        };

        if let Err(error) = submodule::register(&context, &grammar) {
            if let Some(name) = replaced {
                warning!("{name} was already deregistered and removed; restore it with git if needed");
            }
            return Err(error);
        }

        pipeline::run(&context)?;

        success!("Added {} from {}", grammar.path.display(), grammar.url);
        Ok(())
    }
}
