use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "wallet-auth")]
#[command(about = "Wallet sign-in server issuing nonce challenges and cookie sessions")]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Bind host override
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port override
    #[arg(long)]
    pub port: Option<u16>,

    /// Origin used in sign-in messages when requests carry no Origin header
    #[arg(long)]
    pub public_origin: Option<String>,
}
