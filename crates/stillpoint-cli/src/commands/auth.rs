use clap::Subcommand;
use stillpoint_core::api::types::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
};
use stillpoint_core::{Config, TokenStore};

use super::{api_client, runtime, CmdResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account and log in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and store the token in the OS keyring
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log out and forget the stored token
    Logout,
    /// Show whether a token is stored
    Status {
        /// Also fetch the profile from the server
        #[arg(long)]
        remote: bool,
    },
    /// Request a password reset code by email
    Forgot {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with a reset code
    Reset {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        password: String,
    },
}

pub fn run(action: AuthAction) -> CmdResult {
    let config = Config::load_or_default();
    let api = api_client(&config)?;
    let rt = runtime()?;

    match action {
        AuthAction::Register {
            name,
            email,
            password,
        } => {
            let user = rt.block_on(api.register(&RegisterRequest {
                name,
                email,
                password,
            }))?;
            println!("registered as {} <{}>", user.name, user.email);
        }
        AuthAction::Login { email, password } => {
            let user = rt.block_on(api.login(&LoginRequest { email, password }))?;
            println!("logged in as {} <{}>", user.name, user.email);
        }
        AuthAction::Logout => {
            rt.block_on(api.logout())?;
            println!("logged out");
        }
        AuthAction::Status { remote } => {
            if !api.tokens().is_logged_in() {
                println!("not logged in");
                return Ok(());
            }
            if remote {
                let user = rt.block_on(api.profile())?;
                println!("logged in as {} <{}>", user.name, user.email);
            } else {
                println!("logged in");
            }
        }
        AuthAction::Forgot { email } => {
            let ack = rt.block_on(api.forgot_password(&ForgotPasswordRequest { email }))?;
            println!("{}", ack.message.as_deref().unwrap_or("reset code sent"));
        }
        AuthAction::Reset {
            email,
            code,
            password,
        } => {
            let ack = rt.block_on(api.reset_password(&ResetPasswordRequest {
                email,
                code,
                password,
            }))?;
            println!("{}", ack.message.as_deref().unwrap_or("password updated"));
        }
    }
    Ok(())
}
