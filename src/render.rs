use std::fmt::Write;

use chrono::{DateTime, FixedOffset, Utc};
use shuttle_core::{
    Bet, ClockTime, Court, Game, GameSummary, Session, SessionBetsSummary, SessionSummary,
    Shuttle, User, UserRef, shuttles_by_type, total_shuttles,
};
use shuttle_domain::pages::Loadable;

pub fn loadable<T>(state: &Loadable<T>, render: impl Fn(&T) -> String) -> String {
    match state {
        Loadable::Loading => "Loading...\n".to_string(),
        Loadable::Loaded(value) => render(value),
        Loadable::Failed(message) => format!("Error: {}\n", message),
    }
}

pub fn when(instant: DateTime<Utc>, zone: FixedOffset) -> String {
    format!(
        "{} {}",
        instant.with_timezone(&zone).format("%Y-%m-%d"),
        ClockTime::from_instant(instant, zone)
    )
}

fn clock(instant: Option<DateTime<Utc>>, zone: FixedOffset) -> String {
    match instant {
        Some(instant) => ClockTime::from_instant(instant, zone).to_string(),
        None => "-".to_string(),
    }
}

fn names(users: &[&UserRef]) -> String {
    users
        .iter()
        .map(|u| u.name.as_str())
        .collect::<Vec<_>>()
        .join(" & ")
}

fn flag(active: bool) -> &'static str {
    if active { "" } else { " (inactive)" }
}

pub fn sessions(sessions: &[Session], zone: FixedOffset) -> String {
    let mut out = String::new();
    for session in sessions {
        let state = if session.is_ongoing() { "ongoing" } else { "ended" };
        let _ = writeln!(
            out,
            "{}  {}  {}  {} games, {} players",
            session.id,
            when(session.start, zone),
            state,
            session.games.len(),
            session.available_players.len()
        );
    }
    if out.is_empty() {
        out.push_str("No sessions\n");
    }
    out
}

pub fn session(session: &Session, zone: FixedOffset) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Session {}", session.id);
    let _ = writeln!(out, "  started  {}", when(session.start, zone));
    if let Some(end) = session.end {
        let _ = writeln!(out, "  ended    {}", when(end, zone));
    }
    if let Some(court) = &session.court {
        let _ = writeln!(out, "  court    {}", court.name);
    }
    if let Some(shuttle) = &session.shuttle {
        let _ = writeln!(out, "  shuttle  {}", shuttle.name);
    }
    let players: Vec<&UserRef> = session.available_players.iter().collect();
    let _ = writeln!(out, "  players  {}", names(&players));
    out
}

pub fn game_line(game: &Game, zone: FixedOffset) -> String {
    let side_a: Vec<&UserRef> = [Some(&game.a1), game.a2.as_ref()].into_iter().flatten().collect();
    let side_b: Vec<&UserRef> = [Some(&game.b1), game.b2.as_ref()].into_iter().flatten().collect();
    let shuttles: u32 = game.shuttles_used.iter().map(|u| u.quantity).sum();
    let winner = match game.winner {
        Some(side) => format!("  winner {:?}", side),
        None => String::new(),
    };
    format!(
        "{}  {} - {}  {} {} vs {}  {}  {} shuttle(s)  {:?}{}",
        game.id,
        clock(Some(game.start), zone),
        clock(game.end, zone),
        if game.is_doubles() { "doubles" } else { "singles" },
        names(&side_a),
        names(&side_b),
        game.court.as_ref().map(|c| c.name.as_str()).unwrap_or("-"),
        shuttles,
        game.status,
        winner
    )
}

pub fn games(games: &[Game], zone: FixedOffset) -> String {
    let mut out = String::new();
    for game in games {
        let _ = writeln!(out, "{}", game_line(game, zone));
    }
    let _ = writeln!(out, "Total shuttles: {}", total_shuttles(games));
    for (shuttle, quantity) in shuttles_by_type(games) {
        let _ = writeln!(out, "  {}: {}", shuttle.name, quantity);
    }
    out
}

pub fn bet_line(bet: &Bet) -> String {
    format!(
        "{}  {}  {:.2}  {} vs {}  {}{}",
        bet.id,
        bet.bet_type,
        bet.bet_amount,
        bet.bettor_for_a.name,
        bet.bettor_for_b.name,
        if bet.paid { "paid" } else { "unpaid" },
        flag(bet.active)
    )
}

pub fn bets(bets: &[Bet]) -> String {
    if bets.is_empty() {
        return "No bets\n".to_string();
    }
    bets.iter().map(|b| format!("{}\n", bet_line(b))).collect()
}

pub fn users(users: &[User]) -> String {
    users
        .iter()
        .map(|u| {
            let sponsors: Vec<&UserRef> = u.sponsors.iter().collect();
            let sponsored = if sponsors.is_empty() {
                String::new()
            } else {
                format!("  sponsored by {}", names(&sponsors))
            };
            format!(
                "{}  {} (@{})  {}{}{}\n",
                u.id,
                u.name,
                u.username,
                u.role.as_str(),
                flag(u.active),
                sponsored
            )
        })
        .collect()
}

pub fn courts(courts: &[Court]) -> String {
    courts
        .iter()
        .map(|c| format!("{}  {}  {:.2}{}\n", c.id, c.name, c.price, flag(c.active)))
        .collect()
}

pub fn shuttles(shuttles: &[Shuttle]) -> String {
    shuttles
        .iter()
        .map(|s| format!("{}  {}  {:.2}{}\n", s.id, s.name, s.price, flag(s.active)))
        .collect()
}

pub fn game_summary(summary: &GameSummary) -> String {
    let mut out = format!(
        "Game {}: court {:.2} + shuttles {:.2} = {:.2}\n",
        summary.game_id, summary.court_fee, summary.shuttle_fee, summary.total
    );
    for share in &summary.players {
        let _ = writeln!(out, "  {:<20} {:>8.2}", share.user.name, share.amount);
    }
    out
}

pub fn session_summary(summary: &SessionSummary) -> String {
    let mut out = format!(
        "Session {}: {} games, court {:.2} + shuttles {:.2} = {:.2}\n",
        summary.session_id,
        summary.games_played,
        summary.court_total,
        summary.shuttle_total,
        summary.total
    );
    for player in &summary.players {
        let _ = writeln!(
            out,
            "  {:<20} {:>3} played {:>3} W {:>3} L {:>8.2}",
            player.user.name, player.games_played, player.wins, player.losses, player.amount
        );
    }
    for sponsor in &summary.sponsors {
        let sponsored: Vec<&UserRef> = sponsor.sponsored.iter().collect();
        let _ = writeln!(
            out,
            "  sponsor {} pays {:.2} for {}",
            sponsor.sponsor.name,
            sponsor.amount,
            names(&sponsored)
        );
    }
    out
}

pub fn bets_summary(summary: &SessionBetsSummary) -> String {
    let mut out = format!(
        "Session {} bets: {:.2} wagered\n",
        summary.session_id, summary.total_wagered
    );
    for bettor in &summary.bettors {
        let _ = writeln!(
            out,
            "  {:<20} {:>3} W {:>3} L  net {:>8.2}  unpaid {:>8.2}",
            bettor.user.name, bettor.wins, bettor.losses, bettor.net, bettor.unpaid
        );
    }
    out
}
