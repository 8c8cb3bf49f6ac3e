//! External transaction signer.
//!
//! [`ElectrumCli`] pipes the transaction file into the `electrum` command line
//! tool. Only the output addresses and values of the deserialized transaction
//! are read.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use serde::Deserialize;

use crate::core::errors::{CsError, Result};

/// Satoshi per bitcoin.
pub const SATOSHI_PER_BTC: f64 = 100_000_000.0;

/// One output of a deserialized transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub address: String,
    pub value_sat: u64,
}

impl TxOutput {
    #[must_use]
    pub fn amount_btc(&self) -> f64 {
        self.value_sat as f64 / SATOSHI_PER_BTC
    }

    /// Amount in BTC without trailing zeros, always with one decimal.
    #[must_use]
    pub fn amount_text(&self) -> String {
        const SAT: u64 = 100_000_000;
        let fraction = format!("{:08}", self.value_sat % SAT);
        let fraction = fraction.trim_end_matches('0');
        let fraction = if fraction.is_empty() { "0" } else { fraction };
        format!("{}.{fraction}", self.value_sat / SAT)
    }
}

/// The slow external tool that decodes and signs transactions.
pub trait TransactionSigner: Send + Sync {
    /// Decode the transaction at `tx_path` into its outputs.
    fn deserialize(&self, tx_path: &Path) -> Result<Vec<TxOutput>>;
    /// Sign `tx_path` and write the result to `out_path`, which must not exist.
    fn sign(&self, tx_path: &Path, out_path: &Path, password: &str) -> Result<()>;
    /// Version string reported by the tool.
    fn version(&self) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct DeserializedTx {
    outputs: Vec<RawOutput>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    address: String,
    #[serde(alias = "value_sats")]
    value: u64,
}

const INCOMPATIBLE_FORMAT: &str =
    "Transaction file does not seem to be valid or does not have a compatible format.";

/// Parse the JSON printed by `electrum deserialize`.
pub fn parse_outputs(raw: &str, tx_path: &Path) -> Result<Vec<TxOutput>> {
    let parsed: DeserializedTx = serde_json::from_str(raw).map_err(|err| {
        log::debug!("deserialize output rejected: {err}");
        CsError::FileRead {
            path: tx_path.to_path_buf(),
            details: INCOMPATIBLE_FORMAT.to_string(),
        }
    })?;
    Ok(parsed
        .outputs
        .into_iter()
        .map(|out| TxOutput {
            address: out.address,
            value_sat: out.value,
        })
        .collect())
}

/// Signer backed by the `electrum` command line tool.
#[derive(Debug, Clone)]
pub struct ElectrumCli {
    program: PathBuf,
}

impl ElectrumCli {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn unavailable(&self, details: impl Into<String>) -> CsError {
        CsError::ToolUnavailable {
            tool: self.program.clone(),
            details: details.into(),
        }
    }

    /// Run electrum with `args`, feeding `input` on stdin; returns stdout.
    fn run(&self, args: &[&str], input: Option<&[u8]>) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| self.unavailable(err.to_string()))?;

        // Feed stdin from its own thread while stdout is drained, so neither
        // side stalls on a full pipe.
        let stdin = input.and(child.stdin.take());
        let (output, written) = thread::scope(|scope| {
            let writer = stdin.zip(input).map(|(mut stdin, input)| {
                scope.spawn(move || match stdin.write_all(input) {
                    // A tool that exits early closes the pipe; its exit status says why.
                    Err(err) if err.kind() != io::ErrorKind::BrokenPipe => Err(err),
                    _ => Ok(()),
                })
            });
            let output = child.wait_with_output();
            let written = writer.map_or(Ok(()), |handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")))
            });
            (output, written)
        });
        let output = output.map_err(|err| self.unavailable(err.to_string()))?;
        written.map_err(|err| self.unavailable(err.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.unavailable(format!(
                "{} exited with {}: {}",
                args.first().copied().unwrap_or_default(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn read_transaction(tx_path: &Path) -> Result<Vec<u8>> {
    fs::read(tx_path).map_err(|err| CsError::FileRead {
        path: tx_path.to_path_buf(),
        details: err.to_string(),
    })
}

/// Create `out_path` exclusively and write `contents`.
pub fn write_new_file(out_path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(out_path)
        .map_err(|err| {
            if err.kind() == io::ErrorKind::AlreadyExists {
                CsError::WriteCollision {
                    path: out_path.to_path_buf(),
                }
            } else {
                CsError::io(out_path, err)
            }
        })?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .map_err(|err| CsError::io(out_path, err))
}

impl TransactionSigner for ElectrumCli {
    fn deserialize(&self, tx_path: &Path) -> Result<Vec<TxOutput>> {
        let raw_tx = read_transaction(tx_path)?;
        let json = self.run(&["deserialize", "-"], Some(&raw_tx))?;
        parse_outputs(&json, tx_path)
    }

    fn sign(&self, tx_path: &Path, out_path: &Path, password: &str) -> Result<()> {
        let raw_tx = read_transaction(tx_path)?;
        let mut args = vec!["signtransaction", "-"];
        if !password.is_empty() {
            args.extend(["-W", password]);
        }
        let signed = self.run(&args, Some(&raw_tx))?;
        write_new_file(out_path, signed.as_bytes())?;
        log::info!("signed transaction written to {}", out_path.display());
        Ok(())
    }

    fn version(&self) -> Result<String> {
        let out = self.run(&["version"], None)?;
        Ok(out.lines().next().unwrap_or_default().trim().to_string())
    }
}
