//! Startup banner.

use crate::console::Console;

pub const LOGO: &str = r"         _ _
        | | |
__  ____| | |__   __ _ _ __  _ ____  ___   _
\ \/ / _` | '_ \ / _` | '_ \| '__\ \/ / | | |
 >  < (_| | |_) | (_| | |_) | |   >  <| |_| |
/_/\_\__,_|_.__/ \__, | .__/|_|  /_/\_\\__, |
                  __/ | |               __/ |
                 |___/|_|              |___/
";

pub fn starting_line(version: &str) -> String {
    format!("+ Starting XdbgPrxy v{version}")
}

/// Print the logo followed by the version line.
pub fn print_banner(console: &Console, version: &str) {
    console.logo(LOGO);
    console.status(&starting_line(version));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logo_has_eight_lines() {
        assert_eq!(LOGO.lines().count(), 8);
    }

    #[test]
    fn starting_line_carries_version() {
        assert_eq!(starting_line("0.1.0"), "+ Starting XdbgPrxy v0.1.0");
    }
}
