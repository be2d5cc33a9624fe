use clap::{Parser, Subcommand};
use packlock::cli::{
    decrypt_pack_file, encrypt_pack_file, recover_key, show_info, RecoverOptions,
};
use packlock::manifest::KeyScheme;
use packlock::pipeline::EncryptOptions;
use packlock::PacklockError;
use std::path::PathBuf;
use std::process::ExitCode;

/// Version info from build.rs
const VERSION: &str = env!("PACKLOCK_VERSION");
const BUILD: &str = env!("PACKLOCK_BUILD");
const PROFILE: &str = env!("PACKLOCK_PROFILE");
const GIT_HASH: &str = env!("PACKLOCK_GIT_HASH");

/// Combined version string (compile-time concatenation not possible, so we build at runtime)
fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| {
        format!("{} {} build {} ({})", PROFILE, VERSION, BUILD, GIT_HASH)
    })
}

#[derive(Parser)]
#[command(name = "packlock")]
#[command(author, about = "Resource pack encryption toolkit", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a pack zip into a key bundle
    #[command(alias = "e")]
    Encrypt {
        /// Pack zip to encrypt
        input: PathBuf,

        /// Directory to write the bundle into
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Master key (32 characters A-Z a-z 0-9); random when omitted
        #[arg(long)]
        key: Option<String>,

        /// Key scheme: per-file or master
        #[arg(long, default_value = "per-file", value_parser = parse_scheme)]
        scheme: KeyScheme,

        /// Copy this file or folder verbatim instead of encrypting it
        #[arg(long)]
        exclude: Vec<String>,

        /// Encrypt this file or folder even if excluded by default
        #[arg(long)]
        include: Vec<String>,
    },

    /// Decrypt an encrypted pack zip
    #[command(alias = "d")]
    Decrypt {
        /// Encrypted pack zip
        input: PathBuf,

        /// Output zip
        output: PathBuf,

        /// Master key
        #[arg(long, conflicts_with = "key_file")]
        key: Option<String>,

        /// Read the master key from a file (e.g. the bundle's .key file)
        #[arg(long)]
        key_file: Option<PathBuf>,
    },

    /// Show information about an encrypted pack or manifest
    #[command(alias = "i")]
    Info {
        /// Pack zip or raw contents.json
        file: PathBuf,

        /// Decrypt manifests and list their records
        #[arg(long)]
        key: Option<String>,
    },

    /// Brute-force the master key from an encrypted manifest
    #[command(alias = "r")]
    Recover {
        /// Pack zip or raw contents.json
        input: PathBuf,

        /// Worker threads (defaults to the platform concurrency hint)
        #[arg(long)]
        threads: Option<usize>,

        /// Keys per worker assignment
        #[arg(long, default_value = "1000")]
        batch_size: u64,

        /// Stop after roughly this many keys
        #[arg(long)]
        limit: Option<u64>,
    },
}

fn parse_scheme(s: &str) -> Result<KeyScheme, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Handle --version flag
    if cli.version {
        println!("packlock {}", get_version());
        return ExitCode::SUCCESS;
    }

    // Require a command if not showing version
    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            // Show help when no command provided
            use clap::CommandFactory;
            let _ = Cli::command().print_help();
            println!();
            return ExitCode::SUCCESS;
        }
    };

    let result = match command {
        Commands::Encrypt {
            input,
            output_dir,
            key,
            scheme,
            exclude,
            include,
        } => {
            let options = EncryptOptions {
                master_key: key,
                scheme,
                ..Default::default()
            };

            let mut print_progress = |pct: u8| {
                print!("\rEncrypting: {}%", pct);
                use std::io::Write;
                let _ = std::io::stdout().flush();
            };

            match encrypt_pack_file(
                &input,
                &output_dir,
                &options,
                &exclude,
                &include,
                Some(&mut print_progress),
            ) {
                Ok(summary) => {
                    println!();
                    println!("Bundle: {}", summary.bundle_path.display());
                    println!("UUID: {}", summary.uuid);
                    println!("Master key: {}", summary.master_key);
                    println!(
                        "Encrypted {} files, copied {} verbatim",
                        summary.encrypted_files, summary.copied_files
                    );
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }

        Commands::Decrypt {
            input,
            output,
            key,
            key_file,
        } => match resolve_key(key, key_file) {
            Ok(key) => match decrypt_pack_file(&input, &output, &key) {
                Ok(summary) => {
                    println!("Decrypted {} files to {}", summary.files, output.display());
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },

        Commands::Info { file, key } => match show_info(&file, key.as_deref()) {
            Ok(info) => {
                print!("{}", info);
                Ok(())
            }
            Err(e) => Err(e),
        },

        Commands::Recover {
            input,
            threads,
            batch_size,
            limit,
        } => {
            let options = RecoverOptions {
                threads,
                batch_size,
                limit,
            };
            match recover_key(&input, &options) {
                Ok(Some(_)) => Ok(()),
                Ok(None) => {
                    eprintln!("No key found within the configured limit");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn resolve_key(
    key: Option<String>,
    key_file: Option<PathBuf>,
) -> Result<String, PacklockError> {
    match (key, key_file) {
        (Some(key), _) => Ok(key),
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(raw.trim().to_string())
        }
        (None, None) => Err(PacklockError::InvalidFormat(
            "either --key or --key-file is required".into(),
        )),
    }
}
