use clap::{Args, Parser, Subcommand};
use shuttle_core::{ClockTime, GameStatus, Role, Side};

#[derive(Parser)]
#[command(name = "shuttle-console")]
#[command(about = "Run badminton sessions: courts, shuttles, players, games and side bets", long_about = None)]
pub struct Cli {
    /// Print fetched data as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        username: String,

        #[arg(long, env = "SHUTTLE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show who is signed in
    Whoami,

    /// Show a page, e.g. /sessions/42 or /games/7/summary
    Show { route: String },

    #[command(subcommand)]
    Court(PricedCommand),

    #[command(subcommand)]
    Shuttle(PricedCommand),

    #[command(subcommand)]
    User(UserCommand),

    #[command(subcommand)]
    Session(SessionCommand),

    #[command(subcommand)]
    Game(GameCommand),

    #[command(subcommand)]
    Bet(BetCommand),
}

/// Courts and shuttles share the same name/price/active shape.
#[derive(Subcommand)]
pub enum PricedCommand {
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        price: f64,

        #[arg(long)]
        inactive: bool,
    },
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        price: Option<f64>,

        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Args)]
pub struct UserFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub contact: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub role: Option<Role>,

    #[arg(long)]
    pub active: Option<bool>,

    /// Sponsor user id, repeatable
    #[arg(long = "sponsor")]
    pub sponsors: Vec<String>,
}

#[derive(Subcommand)]
pub enum UserCommand {
    Add(UserFields),
    Edit {
        id: String,

        #[command(flatten)]
        fields: UserFields,
    },
    /// Replace the sponsors of a user
    Sponsors { id: String, sponsors: Vec<String> },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    Start {
        #[arg(long)]
        court: Option<String>,

        #[arg(long)]
        shuttle: Option<String>,

        /// Player user id, repeatable
        #[arg(long = "player")]
        players: Vec<String>,
    },
    End {
        id: String,
    },
    AddPlayers {
        id: String,
        players: Vec<String>,
    },
}

#[derive(Args)]
pub struct GameFields {
    #[arg(long)]
    pub a1: Option<String>,

    #[arg(long)]
    pub a2: Option<String>,

    #[arg(long)]
    pub b1: Option<String>,

    #[arg(long)]
    pub b2: Option<String>,

    #[arg(long)]
    pub court: Option<String>,

    /// Start time, e.g. "6:48 PM"
    #[arg(long)]
    pub start: Option<ClockTime>,

    /// End time, e.g. "7:15 PM"
    #[arg(long)]
    pub end: Option<ClockTime>,

    /// Shuttle usage as <shuttle-id>:<quantity>, repeatable
    #[arg(long = "shuttle")]
    pub shuttles: Vec<String>,

    /// Record no shuttle usage
    #[arg(long, conflicts_with = "shuttles")]
    pub no_shuttles: bool,
}

#[derive(Subcommand)]
pub enum GameCommand {
    /// Every game across sessions
    List,
    Add {
        session: String,

        /// Court tab the game is entered from; wins over the session default
        #[arg(long)]
        active_court: Option<String>,

        #[command(flatten)]
        fields: GameFields,
    },
    Edit {
        session: String,
        game: String,

        #[command(flatten)]
        fields: GameFields,

        #[arg(long)]
        status: Option<GameStatus>,

        #[arg(long)]
        winner: Option<Side>,
    },
}

#[derive(Subcommand)]
pub enum BetCommand {
    /// Every bet across games
    List,
    /// Record one or more bettor pairs on a game
    Add {
        game: String,

        #[arg(long = "type")]
        bet_type: String,

        #[arg(long)]
        amount: f64,

        #[arg(long)]
        paid: bool,

        /// "<A>,<B>"; a blank side repeats the previous pair's bettor,
        /// "@<id>" picks a user by id, other text matches or creates a user
        #[arg(long = "pair", required = true)]
        pairs: Vec<String>,
    },
    /// Mark a bet paid (or unpaid)
    Paid {
        id: String,

        #[arg(long)]
        unpaid: bool,
    },
}
