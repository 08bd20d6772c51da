//! Runtime inputs and the text command language frontends share.
//!
//! One command per line, words separated by whitespace. See [`HELP`] for the
//! full list.

use rider_client::ClientEvent;
use rider_core::chat::Peer;
use rider_proto::{
    Attachment, OrderId, PayoutId, ThreadId,
    profile::{Availability, ProfileUpdate},
};
use thiserror::Error;

/// Something the runtime should react to.
#[derive(Debug, Clone)]
pub enum Input {
    /// Feed an event to the client.
    Event(ClientEvent),
    /// Shut down.
    Quit,
}

impl From<ClientEvent> for Input {
    fn from(event: ClientEvent) -> Self {
        Self::Event(event)
    }
}

/// Parsed command line.
#[derive(Debug, Clone)]
pub enum Command {
    /// Forward to the runtime.
    Input(Input),
    /// Show the command summary. Handled by the frontend.
    Help,
}

/// Command line that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Blank line.
    #[error("empty command")]
    Empty,

    /// First word is not a command.
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),

    /// Required argument missing.
    #[error("`{command}` needs {what}")]
    MissingArgument {
        /// Command name.
        command: &'static str,
        /// Description of the missing argument.
        what: &'static str,
    },

    /// `edit-profile` field not of the form `key=value` or unknown key.
    #[error("bad profile field `{0}`")]
    BadField(String),
}

/// Summary printed by `help`.
pub const HELP: &str = "\
login <email> <password>    log in
logout                      log out
orders                      refresh orders
delete-orders <id>...       delete orders
proof <order> <path>        attach a proof photo
receipt <order> <path>      attach a payment receipt
clear-receipt <order>       remove the staged receipt
advance <order>             move an order to its next stage
inbox                       refresh chat threads
open <thread>               open a thread
delete-thread <thread>      delete a thread
messages                    reload the open thread
close                       leave the open thread
send <text>                 send a message
send-image <path> [text]    send a photo
support                     chat with support
payouts                     refresh payouts
delete-payouts <id>...      delete payout records
profile                     reload profile
online | offline            set availability
edit-profile key=value...   update profile (firstname, lastname, email,
                            contact, wallet, wallet-type, image)
qr                          load payment QR codes
forgot <email>              request a password reset code
verify <code>               submit the reset code
new-password <pw> <confirm> set the new password
quit                        exit";

/// Parse one command line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let name = words.next().ok_or(CommandError::Empty)?;
    let args: Vec<&str> = words.collect();

    let event = match name {
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Input(Input::Quit)),
        "login" => ClientEvent::Login {
            email: arg(&args, 0, "login", "an email")?.to_owned(),
            password: arg(&args, 1, "login", "a password")?.to_owned(),
        },
        "logout" => ClientEvent::Logout,
        "orders" => ClientEvent::RefreshOrders,
        "delete-orders" => {
            ClientEvent::DeleteOrders(args.iter().map(|s| OrderId::new(*s)).collect())
        },
        "proof" => ClientEvent::StageProof {
            order: OrderId::new(arg(&args, 0, "proof", "an order id")?),
            photo: attachment(arg(&args, 1, "proof", "a photo path")?),
        },
        "receipt" => ClientEvent::StageReceipt {
            order: OrderId::new(arg(&args, 0, "receipt", "an order id")?),
            receipt: attachment(arg(&args, 1, "receipt", "a photo path")?),
        },
        "clear-receipt" => ClientEvent::ClearReceipt {
            order: OrderId::new(arg(&args, 0, "clear-receipt", "an order id")?),
        },
        "advance" => ClientEvent::AdvanceOrder {
            order: OrderId::new(arg(&args, 0, "advance", "an order id")?),
        },
        "inbox" => ClientEvent::RefreshInbox,
        "open" => {
            ClientEvent::OpenThread { thread: ThreadId::new(arg(&args, 0, "open", "a thread id")?) }
        },
        "delete-thread" => ClientEvent::DeleteThread {
            thread: ThreadId::new(arg(&args, 0, "delete-thread", "a thread id")?),
        },
        "messages" => ClientEvent::LoadConversation,
        "close" => ClientEvent::CloseConversation,
        "send" => ClientEvent::SendMessage { text: args.join(" "), images: Vec::new() },
        "send-image" => ClientEvent::SendMessage {
            text: args.get(1..).unwrap_or_default().join(" "),
            images: vec![attachment(arg(&args, 0, "send-image", "a photo path")?)],
        },
        "support" => ClientEvent::StartChat { peer: Peer::support() },
        "payouts" => ClientEvent::RefreshPayouts,
        "delete-payouts" => {
            ClientEvent::DeletePayouts(args.iter().map(|s| PayoutId::new(*s)).collect())
        },
        "profile" => ClientEvent::LoadProfile,
        "online" => ClientEvent::SetAvailability(Availability::Available),
        "offline" => ClientEvent::SetAvailability(Availability::Offline),
        "edit-profile" => ClientEvent::UpdateProfile(profile_update(&args)?),
        "qr" => ClientEvent::LoadQrCodes,
        "forgot" => ClientEvent::RequestResetCode {
            email: arg(&args, 0, "forgot", "an email")?.to_owned(),
        },
        "verify" => {
            ClientEvent::VerifyResetCode { code: arg(&args, 0, "verify", "a code")?.to_owned() }
        },
        "new-password" => ClientEvent::ChangePassword {
            new_password: arg(&args, 0, "new-password", "a password")?.to_owned(),
            confirm_password: arg(&args, 1, "new-password", "the confirmation")?.to_owned(),
        },
        other => return Err(CommandError::Unknown(other.to_owned())),
    };
    Ok(Command::Input(Input::Event(event)))
}

fn arg<'a>(
    args: &[&'a str],
    index: usize,
    command: &'static str,
    what: &'static str,
) -> Result<&'a str, CommandError> {
    args.get(index).copied().ok_or(CommandError::MissingArgument { command, what })
}

/// Local image at `path` as a JPEG attachment.
pub fn attachment(path: &str) -> Attachment {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let uri = if path.contains("://") { path.to_owned() } else { format!("file://{path}") };
    Attachment::jpeg(uri, file_name)
}

fn profile_update(args: &[&str]) -> Result<ProfileUpdate, CommandError> {
    let mut update = ProfileUpdate::default();
    for field in args {
        let (key, value) =
            field.split_once('=').ok_or_else(|| CommandError::BadField((*field).to_owned()))?;
        let value = value.to_owned();
        match key {
            "firstname" => update.firstname = value,
            "lastname" => update.lastname = value,
            "email" => update.email = value,
            "contact" => update.contact = value,
            "wallet" => update.wallet_number = value,
            "wallet-type" => update.wallet_type = value,
            "image" => update.image = Some(attachment(&value)),
            _ => return Err(CommandError::BadField((*field).to_owned())),
        }
    }
    Ok(update)
}
