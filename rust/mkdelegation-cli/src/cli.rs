use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mkdelegation_ucan::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES};

/// Command line interface of the `mkdelegation` binary.
#[derive(Debug, Parser)]
#[command(name = "mkdelegation")]
#[command(bin_name = "mkdelegation")]
#[command(about = "Issue and inspect UCAN delegations", long_about = None)]
pub struct MkDelegationCli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging. `RUST_LOG` takes precedence when set.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a UCAN delegation and print it as an identity CID.
    #[command(alias = "g")]
    Gen(GenArgs),

    /// Parse a delegation from a file or stdin and display it.
    #[command(alias = "p")]
    Parse(ParseArgs),

    /// Issue the delegations between the upload service, the indexing
    /// service and a storage node.
    Services(ServicesArgs),

    /// Generate a fresh Ed25519 key and print its DID and private key.
    Key,
}

/// Arguments of `mkdelegation gen`.
#[derive(Debug, Args)]
pub struct GenArgs {
    /// Path to a PEM encoded (PKCS#8) Ed25519 private key of the issuer.
    #[arg(
        short = 'f',
        long,
        conflicts_with = "issuer_private_key",
        required_unless_present = "issuer_private_key"
    )]
    pub issuer_private_key_file: Option<PathBuf>,

    /// Multibase encoded Ed25519 private key of the issuer.
    #[arg(short = 'i', long)]
    pub issuer_private_key: Option<String>,

    /// did:web identity the issuer signs as, wrapping its did:key.
    #[arg(short = 'w', long)]
    pub issuer_did_web: Option<String>,

    /// did:key of the audience.
    #[arg(short = 'a', long)]
    pub audience_did_key: String,

    /// Ability the issuer grants to the audience. Repeat for several.
    #[arg(short = 'c', long = "capabilities", required = true)]
    pub capabilities: Vec<String>,

    /// Skip checking capabilities against the known abilities.
    #[arg(short = 's', long)]
    pub skip_capability_validation: bool,

    /// Expiration in UTC seconds since the UNIX epoch. 0 means never.
    #[arg(short = 'e', long, default_value_t = 0)]
    pub expiration: u64,

    /// Extra abilities accepted by validation.
    #[arg(
        short = 'k',
        long = "known-ability",
        env = "MKDELEGATION_KNOWN_ABILITIES",
        value_delimiter = ','
    )]
    pub known_abilities: Vec<String>,
}

/// Arguments of `mkdelegation parse`.
#[derive(Debug, Args)]
pub struct ParseArgs {
    /// File holding the delegation. Reads stdin when omitted.
    pub file: Option<PathBuf>,

    /// Print JSON instead of a tree.
    #[arg(short, long)]
    pub json: bool,

    /// Deepest proof nesting to resolve.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Most delegations to resolve in total, the root included.
    #[arg(long, default_value_t = DEFAULT_MAX_NODES)]
    pub max_nodes: usize,
}

/// Arguments of `mkdelegation services`.
///
/// Keys that are not given are generated.
#[derive(Debug, Args)]
pub struct ServicesArgs {
    /// Multibase encoded Ed25519 private key of the upload service.
    #[arg(short = 'u', long)]
    pub upload_service_private_key: Option<String>,

    /// Multibase encoded Ed25519 private key of the indexing service.
    #[arg(short = 'i', long)]
    pub indexing_service_private_key: Option<String>,

    /// Multibase encoded Ed25519 private key of the storage node.
    #[arg(short = 'n', long)]
    pub storage_node_private_key: Option<String>,

    /// Write keys and delegations to `output.json` in a new timestamped
    /// directory.
    #[arg(short, long, conflicts_with = "save")]
    pub json: bool,

    /// Write each delegation to its own `.b64` file in a new timestamped
    /// directory.
    #[arg(short, long)]
    pub save: bool,

    /// Where the timestamped directory is created.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn cli_definition_is_consistent() {
        MkDelegationCli::command().debug_assert();
    }

    #[test]
    fn it_parses_gen_arguments() -> TestResult {
        let cli = MkDelegationCli::try_parse_from([
            "mkdelegation",
            "g",
            "-i",
            "MgCZT5vOnYZoVAeyjnzuJIVY9J4LNtJ+f8Js0cTPuKUpFne0BVEDJjEu6quFIU8yp91/TY/+MYK8GvlKoTDnqOCovCVM=",
            "-a",
            "did:key:z6MkwF2Kh5zFi9fZ4dvmtKJmRQVLtc5MbrfvoXwEbbiwwGXa",
            "-c",
            "blob/allocate",
            "-c",
            "blob/accept",
            "--expiration",
            "4102444800",
        ])?;

        let Command::Gen(args) = cli.command else {
            panic!("expected gen");
        };
        assert_eq!(args.capabilities, vec!["blob/allocate", "blob/accept"]);
        assert_eq!(args.expiration, 4_102_444_800);
        assert!(args.issuer_private_key_file.is_none());
        assert!(!args.skip_capability_validation);
        assert!(!cli.verbose);
        Ok(())
    }

    #[test]
    fn gen_requires_exactly_one_issuer_key() {
        let base = ["mkdelegation", "gen", "-a", "did:key:zAudience", "-c", "blob/accept"];
        assert!(MkDelegationCli::try_parse_from(base).is_err());

        let both: Vec<&str> = base
            .iter()
            .copied()
            .chain(["-i", "Mkey", "-f", "key.pem"])
            .collect();
        assert!(MkDelegationCli::try_parse_from(both).is_err());
    }

    #[test]
    fn gen_requires_capabilities() {
        let result = MkDelegationCli::try_parse_from([
            "mkdelegation",
            "gen",
            "-i",
            "Mkey",
            "-a",
            "did:key:zAudience",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn known_abilities_split_on_commas() -> TestResult {
        let cli = MkDelegationCli::try_parse_from([
            "mkdelegation",
            "gen",
            "-i",
            "Mkey",
            "-a",
            "did:key:zAudience",
            "-c",
            "custom/one",
            "--known-ability",
            "custom/one,custom/two",
        ])?;
        let Command::Gen(args) = cli.command else {
            panic!("expected gen");
        };
        assert_eq!(args.known_abilities, vec!["custom/one", "custom/two"]);
        Ok(())
    }

    #[test]
    fn it_parses_parse_arguments() -> TestResult {
        let cli = MkDelegationCli::try_parse_from(["mkdelegation", "-v", "p", "-j", "proof.b64"])?;
        let Command::Parse(args) = cli.command else {
            panic!("expected parse");
        };
        assert!(cli.verbose);
        assert!(args.json);
        assert_eq!(args.file, Some(PathBuf::from("proof.b64")));
        assert_eq!(args.max_depth, DEFAULT_MAX_DEPTH);
        Ok(())
    }

    #[test]
    fn parse_reads_stdin_without_a_file() -> TestResult {
        let cli = MkDelegationCli::try_parse_from(["mkdelegation", "parse", "--max-depth", "8"])?;
        let Command::Parse(args) = cli.command else {
            panic!("expected parse");
        };
        assert_eq!(args.file, None);
        assert_eq!(args.max_depth, 8);
        assert_eq!(args.max_nodes, DEFAULT_MAX_NODES);
        Ok(())
    }

    #[test]
    fn it_parses_services_arguments() -> TestResult {
        let cli = MkDelegationCli::try_parse_from([
            "mkdelegation",
            "services",
            "-u",
            "Mupload",
            "-n",
            "Mstorage",
            "--save",
            "-o",
            "/tmp/out",
        ])?;
        let Command::Services(args) = cli.command else {
            panic!("expected services");
        };
        assert_eq!(args.upload_service_private_key.as_deref(), Some("Mupload"));
        assert_eq!(args.indexing_service_private_key, None);
        assert_eq!(args.storage_node_private_key.as_deref(), Some("Mstorage"));
        assert!(args.save);
        assert!(!args.json);
        assert_eq!(args.output_dir, PathBuf::from("/tmp/out"));
        Ok(())
    }

    #[test]
    fn services_json_and_save_conflict() {
        let result = MkDelegationCli::try_parse_from(["mkdelegation", "services", "-j", "-s"]);
        assert!(result.is_err());
    }
}
