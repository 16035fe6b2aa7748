use std::env;
use std::fmt;

use console::Term;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::error::KeyStoreError;

pub const PASSPHRASE_ENV: &str = "QOSBOT_PASSPHRASE";
const MAX_PASSPHRASE_ATTEMPTS: usize = 3;

/// 进程启动时录入一次的口令，之后只读。
#[derive(Clone)]
pub struct Passphrase(Zeroizing<String>);

impl Passphrase {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Zeroizing<String>> for Passphrase {
    fn from(value: Zeroizing<String>) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(***)")
    }
}

/// 读取 `name` 对应密钥的口令，并用 `verify` 校验。
///
/// 设置了 `QOSBOT_PASSPHRASE` 时只校验一次；否则在终端中最多尝试三次。
pub fn capture_passphrase<F>(name: &str, verify: F) -> Result<Passphrase, KeyStoreError>
where
    F: Fn(&Passphrase) -> Result<(), KeyStoreError>,
{
    if let Ok(value) = env::var(PASSPHRASE_ENV) {
        if !value.is_empty() {
            let passphrase = Passphrase::new(value);
            verify(&passphrase)?;
            info!(target: "keys", key = name, "已通过环境变量解锁密钥");
            return Ok(passphrase);
        }
    }

    let term = Term::stderr();
    if !term.is_term() {
        return Err(KeyStoreError::Prompt(format!(
            "当前终端不支持交互式输入，请设置 {PASSPHRASE_ENV}"
        )));
    }

    let mut attempts = 0usize;
    loop {
        attempts += 1;
        let input = read_masked_password(&term, &format!("🔓 请输入密钥 {name} 的口令: "))?;
        let passphrase = Passphrase::from(input);
        match verify(&passphrase) {
            Ok(()) => return Ok(passphrase),
            Err(err @ KeyStoreError::WrongPassphrase { .. }) => {
                let remaining = MAX_PASSPHRASE_ATTEMPTS.saturating_sub(attempts);
                warn!(target: "keys", key = name, attempts, remaining, "口令校验失败");
                if remaining == 0 {
                    return Err(err);
                }
                write_notice(&term, &format!("口令错误，还有 {remaining} 次机会。"))?;
            }
            Err(err) => return Err(err),
        }
    }
}

/// 为新密钥设置口令，需输入两次确认。
pub fn prompt_new_passphrase() -> Result<Passphrase, KeyStoreError> {
    let term = Term::stderr();
    if !term.is_term() {
        return Err(KeyStoreError::Prompt(
            "当前终端不支持交互式输入".to_string(),
        ));
    }

    loop {
        let password = read_masked_password(&term, "🔐 设置密钥口令: ")?;
        if password.is_empty() {
            write_notice(&term, "口令不能为空，请重新输入。")?;
            continue;
        }

        let confirmation = read_masked_password(&term, "🔐 确认密钥口令: ")?;
        if *password != *confirmation {
            write_notice(&term, "两次输入的口令不一致，请重试。")?;
            continue;
        }

        return Ok(Passphrase::from(password));
    }
}

fn write_notice(term: &Term, message: &str) -> Result<(), KeyStoreError> {
    term.write_line(message)
        .map_err(|err| KeyStoreError::Prompt(format!("写入提示失败: {err}")))
}

fn read_masked_password(term: &Term, prompt: &str) -> Result<Zeroizing<String>, KeyStoreError> {
    let io_err = |action: &str, err: std::io::Error| KeyStoreError::Prompt(format!("{action}: {err}"));

    term.write_str(prompt)
        .map_err(|err| io_err("写入提示失败", err))?;
    term.flush().map_err(|err| io_err("刷新输出失败", err))?;

    let mut buffer = Zeroizing::new(String::new());
    loop {
        let ch = term
            .read_char()
            .map_err(|err| io_err("读取输入失败", err))?;

        match ch {
            '\n' | '\r' => {
                term.write_str("\n")
                    .map_err(|err| io_err("写入换行失败", err))?;
                term.flush().map_err(|err| io_err("刷新输出失败", err))?;
                break;
            }
            '\u{7f}' | '\u{8}' => {
                if buffer.pop().is_some() {
                    // 退格一位并用空格覆盖，兼容不支持 clear_chars 的终端
                    let _ = term.write_str("\u{8} \u{8}");
                    let _ = term.flush();
                }
            }
            c if c.is_control() => {}
            _ => {
                buffer.push(ch);
                term.write_str("*")
                    .map_err(|err| io_err("写入掩码失败", err))?;
                term.flush().map_err(|err| io_err("刷新输出失败", err))?;
            }
        }
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_secret() {
        let passphrase = Passphrase::new("hunter2");
        assert_eq!(format!("{passphrase:?}"), "Passphrase(***)");
        assert_eq!(passphrase.as_str(), "hunter2");
    }

    #[test]
    fn masked_input_becomes_passphrase() {
        let input = Zeroizing::new(String::from("s3cret"));
        let passphrase = Passphrase::from(input);
        assert_eq!(passphrase.as_str(), "s3cret");
        assert_eq!(format!("{passphrase:?}"), "Passphrase(***)");
    }
}
