//! Interactive desk shell
//!
//! One shell is one login screen: it mounts a [`CredentialGate`] with a fresh
//! session, and mounts a new one after every logout. Gate rejections are
//! printed as notices and the shell keeps running.

use std::io::{BufRead, Write};

use deskgate_core::{AuthError, CredentialGate, Desk, Identity, NewUser, Role};
use zeroize::Zeroizing;

/// A parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// `login <role> <name> <secret|phone>`
    Login {
        role: Role,
        name: String,
        secret_or_phone: String,
    },
    /// `signin <name> <secret|phone>`
    SignIn { name: String, secret_or_phone: String },
    /// `nikitovsky <secret>`
    Nikitovsky { secret: String },
    /// `register <name> <role> [phone] [email]`
    Register {
        name: String,
        role: Role,
        phone: Option<String>,
        email: Option<String>,
    },
    /// `users [role]`
    Users { role: Option<Role> },
    Block,
    /// `unblock <recovery-secret>`
    Unblock { secret: String },
    Status,
    WhoAmI,
    Logout,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let arg = |i: usize, what: &str| -> Result<String, String> {
            args.get(i)
                .map(|s| s.to_string())
                .ok_or_else(|| format!("missing <{}>", what))
        };
        let role_arg = |i: usize| -> Result<Role, String> {
            arg(i, "role")?.parse::<Role>().map_err(|e| e.to_string())
        };
        // Last argument may contain spaces, e.g. a phone typed as `+7 999 ...`
        let rest = |i: usize| -> String { args.get(i..).unwrap_or_default().join(" ") };

        let command = match verb.to_ascii_lowercase().as_str() {
            "login" => ShellCommand::Login {
                role: role_arg(0)?,
                name: arg(1, "name")?,
                secret_or_phone: rest(2),
            },
            "signin" => ShellCommand::SignIn {
                name: arg(0, "name")?,
                secret_or_phone: rest(1),
            },
            "nikitovsky" => ShellCommand::Nikitovsky {
                secret: args.first().map(|s| s.to_string()).unwrap_or_default(),
            },
            "register" => ShellCommand::Register {
                name: arg(0, "name")?,
                role: role_arg(1)?,
                phone: args.get(2).map(|s| s.to_string()),
                email: args.get(3).map(|s| s.to_string()),
            },
            "users" => ShellCommand::Users {
                role: match args.first() {
                    Some(_) => Some(role_arg(0)?),
                    None => None,
                },
            },
            "block" => ShellCommand::Block,
            "unblock" => ShellCommand::Unblock {
                secret: arg(0, "recovery-secret")?,
            },
            "status" => ShellCommand::Status,
            "whoami" => ShellCommand::WhoAmI,
            "logout" => ShellCommand::Logout,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => return Err(format!("unknown command: {}", other)),
        };
        Ok(Some(command))
    }
}

const HELP: &str = "\
Commands:
  login <role> <name> <secret|phone>   log in with an explicit role
  signin <name> <secret|phone>         log in as a registered user
  nikitovsky <secret>                  Nikitovsky login
  whoami                               show the current identity and access
  register <name> <role> [phone] [email]   phone as one token here
  users [role]                         list registered users
  block                                block the Nikitovsky login for 2 hours
  unblock <recovery-secret>            lift the Nikitovsky block
  status                               show lockout and block state
  logout | help | quit";

/// Interactive desk bound to an input and an output stream
pub struct DeskShell<R, W> {
    desk: Desk,
    gate: CredentialGate,
    identity: Option<Identity>,
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> DeskShell<R, W> {
    pub fn new(desk: Desk, input: R, out: W) -> Self {
        let gate = desk.login_screen();
        Self {
            desk,
            gate,
            identity: None,
            input,
            out,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Read and execute lines until `quit` or end of input
    pub fn run(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "Deskgate. Type 'help' for commands.")?;
        loop {
            write!(self.out, "{}> ", self.prompt())?;
            self.out.flush()?;

            let mut line = Zeroizing::new(String::new());
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.out)?;
                return Ok(());
            }

            match ShellCommand::parse(&line) {
                Ok(None) => {}
                Ok(Some(ShellCommand::Quit)) => return Ok(()),
                Ok(Some(command)) => self.execute(command)?,
                Err(msg) => writeln!(self.out, "✗ {}", msg)?,
            }
        }
    }

    fn prompt(&self) -> String {
        match &self.identity {
            Some(identity) => format!("{}@desk", identity.name),
            None => "desk".to_string(),
        }
    }

    /// Execute one command. Only output errors are returned.
    pub fn execute(&mut self, command: ShellCommand) -> std::io::Result<()> {
        match command {
            ShellCommand::Login {
                role,
                name,
                secret_or_phone,
            } => {
                let secret = Zeroizing::new(secret_or_phone);
                let attempt = self.gate.attempt_direct_login(role, &name, &secret);
                self.on_login(attempt)
            }
            ShellCommand::SignIn {
                name,
                secret_or_phone,
            } => {
                let secret = Zeroizing::new(secret_or_phone);
                let attempt = self.gate.attempt_standard_login(&name, &secret);
                self.on_login(attempt)
            }
            ShellCommand::Nikitovsky { secret } => {
                let secret = Zeroizing::new(secret);
                let attempt = self.gate.attempt_nikitovsky_login(&secret);
                self.on_login(attempt)
            }
            ShellCommand::Register {
                name,
                role,
                phone,
                email,
            } => self.register(name, role, phone, email),
            ShellCommand::Users { role } => self.users(role),
            ShellCommand::Block => self.block(),
            ShellCommand::Unblock { secret } => {
                let secret = Zeroizing::new(secret);
                match self.gate.unblock_nikitovsky(&secret) {
                    Ok(()) => writeln!(self.out, "✓ Nikitovsky block lifted"),
                    Err(e) => self.notice(&e),
                }
            }
            ShellCommand::Status => self.status(),
            ShellCommand::WhoAmI => match &self.identity {
                Some(identity) => {
                    let phone = identity
                        .phone
                        .as_deref()
                        .map(|p| format!(" • {}", p))
                        .unwrap_or_default();
                    writeln!(
                        self.out,
                        "{} • {}{}",
                        identity.role.display_name(),
                        identity.name,
                        phone
                    )?;
                    writeln!(self.out, "Access: {}", sections(&identity.role).join(", "))
                }
                None => writeln!(self.out, "Not logged in"),
            },
            ShellCommand::Logout => {
                self.identity = None;
                self.gate = self.desk.login_screen();
                writeln!(self.out, "Logged out")
            }
            ShellCommand::Help => writeln!(self.out, "{}", HELP),
            ShellCommand::Quit => Ok(()),
        }
    }

    fn on_login(&mut self, attempt: deskgate_core::Result<Identity>) -> std::io::Result<()> {
        match attempt {
            Ok(identity) => {
                writeln!(
                    self.out,
                    "✓ Welcome, {} ({})",
                    identity.name,
                    identity.role.display_name()
                )?;
                self.identity = Some(identity);
                Ok(())
            }
            Err(e) => self.notice(&e),
        }
    }

    /// Role of the current identity if it passes `allowed`
    fn authorized(&mut self, allowed: fn(&Role) -> bool) -> std::io::Result<Option<Identity>> {
        match &self.identity {
            Some(identity) if allowed(&identity.role) => Ok(Some(identity.clone())),
            Some(identity) => {
                writeln!(
                    self.out,
                    "✗ Not permitted for {}",
                    identity.role.display_name()
                )?;
                Ok(None)
            }
            None => {
                writeln!(self.out, "✗ Log in first")?;
                Ok(None)
            }
        }
    }

    fn register(
        &mut self,
        name: String,
        role: Role,
        phone: Option<String>,
        email: Option<String>,
    ) -> std::io::Result<()> {
        let Some(actor) = self.authorized(Role::can_manage_users)? else {
            return Ok(());
        };
        let new_user = NewUser {
            name,
            role: Some(role),
            phone,
            email,
        };
        match self.gate.register_user(new_user, &actor.name) {
            Ok(user) => writeln!(
                self.out,
                "✓ {} registered as {}",
                user.name,
                user.role.display_name()
            ),
            Err(e) => self.notice(&e),
        }
    }

    fn users(&mut self, role: Option<Role>) -> std::io::Result<()> {
        if self.authorized(Role::can_manage_users)?.is_none() {
            return Ok(());
        }
        let registry = self.gate.registry();
        let users = match role {
            Some(role) => registry.users_by_role(role),
            None => registry.users(),
        };
        match users {
            Ok(users) => {
                for user in users {
                    writeln!(
                        self.out,
                        "{} | {} | {} | {}",
                        user.name,
                        user.role,
                        user.phone.as_deref().unwrap_or("-"),
                        user.created_by
                    )?;
                }
                Ok(())
            }
            Err(e) => self.notice(&e),
        }
    }

    fn block(&mut self) -> std::io::Result<()> {
        if self.authorized(Role::can_administer)?.is_none() {
            return Ok(());
        }
        match self.gate.block_nikitovsky() {
            Ok(until) => writeln!(
                self.out,
                "✓ Nikitovsky login blocked until {}",
                until.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            Err(e) => self.notice(&e),
        }
    }

    fn status(&mut self) -> std::io::Result<()> {
        let now = self.desk.clock().now();
        match self.gate.session().seconds_left(now) {
            Some(seconds_left) => {
                writeln!(self.out, "Session: suspended for {}s", seconds_left)?
            }
            None => writeln!(
                self.out,
                "Session: open ({} failed attempts)",
                self.gate.session().failed_count()
            )?,
        }
        match self.gate.nikitovsky_block().hours_left() {
            Ok(Some(hours)) => writeln!(self.out, "Nikitovsky: blocked ({}h left)", hours),
            Ok(None) => writeln!(self.out, "Nikitovsky: unblocked"),
            Err(e) => self.notice(&e),
        }
    }

    fn notice(&mut self, error: &AuthError) -> std::io::Result<()> {
        let prefix = if error.is_cooldown() { "🔒" } else { "✗" };
        writeln!(self.out, "{} {}", prefix, error)
    }
}

/// Desk sections a role may open
fn sections(role: &Role) -> Vec<&'static str> {
    let mut sections = Vec::new();
    if role.can_access_cashier() {
        sections.push("cashier");
    }
    if role.can_access_archive() {
        sections.push("archive");
    }
    if role.can_manage_users() {
        sections.push("users");
    }
    if role.can_administer() {
        sections.push("admin");
    }
    if sections.is_empty() {
        sections.push("deposits");
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskgate_core::ManualClock;
    use std::io::Cursor;
    use std::rc::Rc;

    fn run_script(desk: Desk, script: &str) -> String {
        let mut out = Vec::new();
        let mut shell = DeskShell::new(desk, Cursor::new(script.as_bytes().to_vec()), &mut out);
        shell.run().unwrap();
        drop(shell);
        String::from_utf8(out).unwrap()
    }

    fn memory_desk() -> Desk {
        Desk::in_memory(Rc::new(ManualClock::starting_now()))
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ShellCommand::parse("   ").unwrap(), None);
        assert_eq!(
            ShellCommand::parse("login head-cashier Иван 202520").unwrap(),
            Some(ShellCommand::Login {
                role: Role::HeadCashier,
                name: "Иван".to_string(),
                secret_or_phone: "202520".to_string(),
            })
        );
        assert_eq!(
            ShellCommand::parse("users admin").unwrap(),
            Some(ShellCommand::Users {
                role: Some(Role::Admin)
            })
        );
        assert!(ShellCommand::parse("login boss Иван 1").is_err());
        assert!(ShellCommand::parse("unblock").is_err());
        assert!(ShellCommand::parse("dance").is_err());
    }

    #[test]
    fn test_phone_with_spaces_is_kept_whole() {
        assert_eq!(
            ShellCommand::parse("login client Ольга +7 999 000 11 22").unwrap(),
            Some(ShellCommand::Login {
                role: Role::Client,
                name: "Ольга".to_string(),
                secret_or_phone: "+7 999 000 11 22".to_string(),
            })
        );

        let output = run_script(memory_desk(), "login client Ольга +7 999\nwhoami\n");
        assert!(output.contains("Покупатель • Ольга • +7 999"));
        assert!(output.contains("Access: deposits"));
    }

    #[test]
    fn test_whoami_lists_sections_by_role() {
        let output = run_script(memory_desk(), "login cashier Мария 25\nwhoami\n");
        assert!(output.contains("Access: cashier\n"));

        let output = run_script(memory_desk(), "login admin Анна 2025\nwhoami\n");
        assert!(output.contains("Access: cashier, archive, users, admin"));
    }

    #[test]
    fn test_status_rounds_suspension_up() {
        let clock = Rc::new(ManualClock::starting_now());
        let desk = Desk::in_memory(clock.clone());
        let mut out = Vec::new();
        {
            let mut shell = DeskShell::new(desk, Cursor::new(Vec::new()), &mut out);
            for secret in ["1", "2", "3"] {
                shell
                    .execute(ShellCommand::Login {
                        role: Role::Admin,
                        name: "Анна".to_string(),
                        secret_or_phone: secret.to_string(),
                    })
                    .unwrap();
            }
            clock.advance(chrono::Duration::milliseconds(500));
            shell.execute(ShellCommand::Status).unwrap();
        }
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Session: suspended for 90s"));
    }

    #[test]
    fn test_missing_secret_parses_as_empty() {
        assert_eq!(
            ShellCommand::parse("signin Иван").unwrap(),
            Some(ShellCommand::SignIn {
                name: "Иван".to_string(),
                secret_or_phone: String::new(),
            })
        );
    }

    #[test]
    fn test_lockout_notice_in_shell() {
        let output = run_script(
            memory_desk(),
            "login admin Анна 1\nlogin admin Анна 2\nlogin admin Анна 3\nlogin admin Анна 2025\n",
        );
        assert!(output.contains("2 attempts remaining"));
        assert!(output.contains("🔒 Login suspended for 90 seconds"));
        assert!(!output.contains("Welcome"));
    }

    #[test]
    fn test_register_requires_capability() {
        let desk = memory_desk();
        let output = run_script(
            desk.clone(),
            "register Иван cashier\nlogin cashier Мария 25\nregister Иван cashier\nlogout\nlogin admin Анна 2025\nregister Иван cashier\nregister иван admin\nquit\n",
        );
        assert!(output.contains("✗ Log in first"));
        assert!(output.contains("✗ Not permitted for Кассир"));
        assert!(output.contains("✓ Иван registered as Кассир"));
        assert!(output.contains("already exists"));

        let user = desk.registry().find_by_name("иван").unwrap().unwrap();
        assert_eq!(user.created_by, "Анна");
    }

    #[test]
    fn test_block_and_unblock_from_shell() {
        let output = run_script(
            memory_desk(),
            "login admin Анна 2025\nblock\nnikitovsky 20252025\nunblock 1999\nunblock 2025\nnikitovsky 20252025\nwhoami\n",
        );
        assert!(output.contains("✓ Nikitovsky login blocked until"));
        assert!(output.contains("🔒 Nikitovsky login blocked for 2 hours"));
        assert!(output.contains("✗ Wrong secret"));
        assert!(output.contains("✓ Nikitovsky block lifted"));
        assert!(output.contains("✓ Welcome, Никитовский"));
        assert!(output.contains("Никитовский • Никитовский"));
    }

    #[test]
    fn test_logout_mounts_fresh_session() {
        let output = run_script(
            memory_desk(),
            "login admin Анна 1\nlogin admin Анна 2\nlogout\nlogin admin Анна 3\nstatus\n",
        );
        assert!(output.contains("Session: open (1 failed attempts)"));
    }
}
