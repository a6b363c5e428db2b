use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sprig")]
#[command(about = "Numbered outlines over flat records with parent links", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Use the per-user outline instead of the one in the current directory
    #[arg(short, long, global = true)]
    pub global: bool,

    /// Data directory (overrides --global)
    #[arg(long, global = true, env = "SPRIG_DIR")]
    pub dir: Option<PathBuf>,

    /// Verbose logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory
    Init,

    /// Show the outline
    #[command(alias = "ls")]
    List {
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one record and its subtree
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Add a record
    #[command(alias = "a")]
    Add {
        /// Parent record (top level if omitted)
        #[arg(short, long)]
        parent: Option<String>,

        /// Fields as key=value; a bare value sets the title field
        #[arg(num_args = 0..)]
        fields: Vec<String>,
    },

    /// Set or remove fields on a record
    #[command(alias = "e")]
    Edit {
        id: String,

        /// Fields as key=value
        #[arg(num_args = 0..)]
        fields: Vec<String>,

        /// Fields to remove
        #[arg(long, num_args = 1..)]
        unset: Vec<String>,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        id: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Move a record one level up
    Promote { id: String },

    /// Move a record under its previous sibling
    Demote { id: String },

    /// Swap a record with its previous sibling
    Up { id: String },

    /// Swap a record with its next sibling
    Down { id: String },

    /// Move a record under another one
    #[command(alias = "mv")]
    Move {
        id: String,

        /// New parent (top level if omitted)
        #[arg(long)]
        to: Option<String>,
    },

    /// Rewrite stale position labels
    Renumber,

    /// Check for broken parent links and stale labels
    Doctor {
        #[arg(long)]
        fix: bool,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (order-field, label-roots, delete-policy, title-field)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_move_and_verbosity() {
        let cli = Cli::try_parse_from(["sprig", "-vv", "mv", "3", "--to", "1"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Move { id, to }) => {
                assert_eq!(id, "3");
                assert_eq!(to.as_deref(), Some("1"));
            }
            other => panic!("Expected move, got {:?}", other),
        }
    }

    #[test]
    fn add_collects_fields() {
        let cli = Cli::try_parse_from(["sprig", "add", "-p", "2", "name=Ship", "owner=ana"]).unwrap();
        match cli.command {
            Some(Commands::Add { parent, fields }) => {
                assert_eq!(parent.as_deref(), Some("2"));
                assert_eq!(fields, vec!["name=Ship", "owner=ana"]);
            }
            other => panic!("Expected add, got {:?}", other),
        }
    }
}
