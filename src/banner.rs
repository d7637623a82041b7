use std::io::{self, Write};

fn banner_text(suffix: &str, color: bool) -> String {
    let (c, r) = if color {
        ("\x1b[96m", "\x1b[0m")
    } else {
        ("", "")
    };
    let logo = concat!(
        "__   __                                _            \n",
        "\\ \\ / /__ _ __ _ __   __ _  ___ _   _| | __ _ _ __ \n",
        " \\ V / _ \\ '__| '_ \\ / _` |/ __| | | | |/ _` | '__|\n",
        "  | |  __/ |  | | | | (_| | (__| |_| | | (_| | |   \n",
        "  |_|\\___|_|  |_| |_|\\__,_|\\___|\\__,_|_|\\__,_|_|   \n",
    );
    format!("\n{c}{logo}{r}🔁 {suffix}\n")
}

/// REPL banner naming the loaded language. Goes to stderr so stdout only
/// carries transpiled code.
pub fn print_repl_banner(language: &str, color: bool) {
    let _ = io::stderr().write_all(
        banner_text(&format!("Vernacular REPL – {language} ⇄ Python"), color).as_bytes(),
    );
}

pub fn print_server_banner(color: bool) {
    let _ = io::stdout().write_all(
        banner_text("Vernacular API – custom vocabulary ⇄ Python", color).as_bytes(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_is_optional() {
        assert!(banner_text("x", true).contains("\x1b[96m"));
        let plain = banner_text("Vernacular REPL – GenZ ⇄ Python", false);
        assert!(!plain.contains('\x1b'));
        assert!(plain.ends_with("🔁 Vernacular REPL – GenZ ⇄ Python\n"));
    }
}
