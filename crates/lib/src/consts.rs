/// Default PowerShell executable used to run rendered scripts.
pub const POWERSHELL_EXE: &str = "powershell.exe";

/// Default arguments placed between the executable and the quoted script.
pub const POWERSHELL_ARGS: &[&str] = &["-ExecutionPolicy", "RemoteSigned", "-Command"];

/// Prelude every rendered script starts with.
pub const WEB_ADMINISTRATION_PRELUDE: &str = "Import-Module WebAdministration; ";

/// Value IIS uses for "any address".
pub const ANY_ADDRESS: &str = "*";

/// Default `ensure` state when none is declared.
pub const DEFAULT_ENSURE: &str = "present";
