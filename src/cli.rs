use clap::{Args, Parser, Subcommand, ValueEnum};

use orphansweep::catalog::Role;
use orphansweep::sweep::OutputMode;

#[derive(Debug, Parser)]
#[command(name = "orphansweep")]
#[command(about = "Manager of UUID named files", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Discover or clean orphaned UUID named files
    Clean(CleanArgs),
    /// Batch handler for release-proof records awaiting content scans
    Proof,
    /// Resolve catalog directories, optionally provisioning placeholders
    Init(InitArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(subcommand)]
    pub target: CleanTarget,

    /// Archive then delete all found orphaned files
    #[arg(long, global = true)]
    pub delete: bool,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub output: OutputFormat,

    /// Dehumanize size and time details
    #[arg(long, global = true)]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Also provision placeholder content in the UUID directories
    #[arg(long)]
    pub create: bool,
}

#[derive(Debug, Subcommand)]
pub enum CleanTarget {
    /// Every scannable directory
    All,
    /// UUID named file downloads
    Downloads,
    /// Emulation assets, every tier unless one is named
    Emulation {
        #[arg(value_enum)]
        tier: Option<EmulationTier>,
    },
    /// Image previews and thumbnails, every tier unless some are named
    Images {
        #[arg(value_enum)]
        tiers: Vec<ImageTier>,
    },
    /// Webapp generated JSON files
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EmulationTier {
    Text,
    Zip,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ImageTier {
    #[value(name = "150")]
    Thumb150,
    #[value(name = "400")]
    Thumb400,
    Capt,
    Desc,
    Info,
    Prev,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    None,
}

impl From<OutputFormat> for OutputMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => OutputMode::Text,
            OutputFormat::None => OutputMode::Silent,
        }
    }
}

const ALL_IMAGE_ROLES: [Role; 6] = [
    Role::Img150,
    Role::Img400,
    Role::Capture,
    Role::Description,
    Role::Information,
    Role::Preview,
];

impl CleanTarget {
    /// Directory roles selected by this target, in scan order.
    pub fn roles(&self) -> Vec<Role> {
        match self {
            CleanTarget::All => {
                let mut roles = vec![Role::Uuid, Role::Emulation, Role::EmulationZip];
                roles.extend(ALL_IMAGE_ROLES);
                roles.push(Role::Json);
                roles
            }
            CleanTarget::Downloads => vec![Role::Uuid],
            CleanTarget::Emulation { tier } => match tier {
                Some(EmulationTier::Text) => vec![Role::Emulation],
                Some(EmulationTier::Zip) => vec![Role::EmulationZip],
                None => vec![Role::Emulation, Role::EmulationZip],
            },
            CleanTarget::Images { tiers } => {
                if tiers.is_empty() {
                    ALL_IMAGE_ROLES.to_vec()
                } else {
                    tiers.iter().map(|tier| tier.role()).collect()
                }
            }
            CleanTarget::Json => vec![Role::Json],
        }
    }
}

impl ImageTier {
    pub fn role(self) -> Role {
        match self {
            ImageTier::Thumb150 => Role::Img150,
            ImageTier::Thumb400 => Role::Img400,
            ImageTier::Capt => Role::Capture,
            ImageTier::Desc => Role::Description,
            ImageTier::Info => Role::Information,
            ImageTier::Prev => Role::Preview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_asserts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_target_roles() {
        assert_eq!(CleanTarget::Downloads.roles(), vec![Role::Uuid]);
        assert_eq!(CleanTarget::All.roles().len(), 10);
        assert_eq!(
            CleanTarget::Emulation { tier: None }.roles(),
            vec![Role::Emulation, Role::EmulationZip]
        );
        assert_eq!(
            CleanTarget::Images {
                tiers: vec![ImageTier::Thumb400, ImageTier::Capt]
            }
            .roles(),
            vec![Role::Img400, Role::Capture]
        );
        assert_eq!(CleanTarget::Images { tiers: vec![] }.roles().len(), 6);
    }

    #[test]
    fn test_parse_clean_with_flags() {
        let cli = Cli::try_parse_from([
            "orphansweep",
            "clean",
            "images",
            "150",
            "400",
            "--delete",
            "--output",
            "none",
            "--raw",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Clean(args)) => {
                assert!(args.delete);
                assert!(args.raw);
                assert_eq!(args.output, OutputFormat::None);
                assert_eq!(args.target.roles(), vec![Role::Img150, Role::Img400]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
