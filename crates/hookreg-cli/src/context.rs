use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use hookreg_solana_client::catalog::parse_pubkey;
use hookreg_solana_client::{ClientConfig, HookKind, KeypairSigner, RegistryClient, SolanaRpc};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, write_keypair_file, Keypair};

use crate::args::Cli;

pub type Client = RegistryClient<SolanaRpc>;

/// Defaults, then the `--config` file, then flags.
pub fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
            ClientConfig::from_json(&raw)?
        }
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.url {
        cfg.rpc_url = url.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

pub fn client(cli: &Cli) -> Result<Client> {
    let cfg = load_config(cli)?;
    let rpc = SolanaRpc::new(cfg.rpc_url.clone(), cfg.commitment.to_config());
    Ok(RegistryClient::new(rpc, cfg))
}

pub fn signer(cli: &Cli) -> Result<KeypairSigner> {
    let path = match &cli.keypair {
        Some(p) => PathBuf::from(p),
        None => default_keypair_path()?,
    };
    Ok(KeypairSigner::from_file(path)?)
}

fn default_keypair_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or_else(|| anyhow!("HOME is not set; pass --keypair"))?;
    Ok(PathBuf::from(home).join(".config/solana/id.json"))
}

pub fn pubkey(s: &str) -> Result<Pubkey> {
    Ok(parse_pubkey(s)?)
}

pub fn opt_pubkey(s: Option<&str>) -> Result<Option<Pubkey>> {
    s.map(pubkey).transpose()
}

/// A hook program given as a catalog id (`royalty`, `custom:<id>`) or a bare id.
pub fn hook_program(s: &str) -> Result<Pubkey> {
    match s.parse::<HookKind>() {
        Ok(kind) => Ok(kind.program_id()),
        Err(_) => pubkey(s).map_err(|_| anyhow!("not a hook id or program address: {s}")),
    }
}

/// Read the keypair at `path`, or generate one and write it there.
/// The flag is true when the keypair was created.
pub fn load_or_create_keypair(path: &Path) -> Result<(Keypair, bool)> {
    if path.exists() {
        let kp = read_keypair_file(path)
            .map_err(|e| anyhow!("failed to read keypair {}: {e}", path.display()))?;
        return Ok((kp, false));
    }
    let kp = Keypair::new();
    write_keypair_file(&kp, path)
        .map_err(|e| anyhow!("failed to write keypair {}: {e}", path.display()))?;
    Ok((kp, true))
}
