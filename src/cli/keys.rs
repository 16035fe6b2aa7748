use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use zeroize::Zeroizing;

use crate::cli::args::{KeysAddArgs, KeysCmd, KeysHomeArgs};
use crate::config::{BotConfig, resolve_home};
use crate::keys::{FileKeyStore, KeyStore, prompt_new_passphrase};

pub fn handle_keys_cmd(cmd: KeysCmd, config: &BotConfig) -> Result<()> {
    match cmd {
        KeysCmd::Add(args) => handle_keys_add(args, config),
        KeysCmd::List(home) => handle_keys_list(home, config),
        KeysCmd::Show { name, home } => handle_keys_show(&name, home, config),
    }
}

fn open_store(home: KeysHomeArgs, config: &BotConfig) -> Result<FileKeyStore> {
    let home: PathBuf = home.home.unwrap_or_else(|| resolve_home(config));
    FileKeyStore::open(&home).with_context(|| format!("打开密钥库失败: {}", home.display()))
}

fn handle_keys_add(args: KeysAddArgs, config: &BotConfig) -> Result<()> {
    let store = open_store(args.home, config)?;
    let seed = args.import.as_deref().map(parse_seed).transpose()?;
    let passphrase = prompt_new_passphrase()?;
    let info = store.create(&args.name, &passphrase, seed.map(|seed| *seed))?;

    println!("🔐 已新增密钥 [{}]", info.name);
    println!("地址：{}", info.address);
    println!("公钥：{}", info.public_key);
    println!("密钥库位置：{}", store.dir().display());
    Ok(())
}

fn handle_keys_list(home: KeysHomeArgs, config: &BotConfig) -> Result<()> {
    let store = open_store(home, config)?;
    let keys = store.list()?;
    if keys.is_empty() {
        println!("密钥库 {} 中没有密钥，可使用 `qosbot keys add <NAME>` 新建", store.dir().display());
        return Ok(());
    }
    for info in keys {
        println!("{}\t{}\t{}", info.name, info.address, info.public_key);
    }
    Ok(())
}

fn handle_keys_show(name: &str, home: KeysHomeArgs, config: &BotConfig) -> Result<()> {
    let store = open_store(home, config)?;
    let info = store.key_info(name)?;
    println!("名称：{}", info.name);
    println!("地址：{}", info.address);
    println!("公钥：{}", info.public_key);
    Ok(())
}

fn parse_seed(raw: &str) -> Result<Zeroizing<[u8; 32]>> {
    let bytes = Zeroizing::new(
        hex::decode(raw.trim().trim_start_matches("0x")).map_err(|err| anyhow!("种子不是合法十六进制: {err}"))?,
    );
    let seed: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("种子长度必须为 32 字节，实际 {} 字节", bytes.len()))?;
    Ok(Zeroizing::new(seed))
}
