use crate::{Game, Shuttle};

pub fn total_shuttles(games: &[Game]) -> u32 {
    games
        .iter()
        .flat_map(|game| game.shuttles_used.iter())
        .map(|usage| usage.quantity)
        .sum()
}

/// Shuttle consumption grouped per shuttle, in order of first use.
pub fn shuttles_by_type(games: &[Game]) -> Vec<(Shuttle, u32)> {
    let mut totals: Vec<(Shuttle, u32)> = Vec::new();
    for usage in games.iter().flat_map(|game| game.shuttles_used.iter()) {
        match totals.iter_mut().find(|(s, _)| s.id == usage.shuttle.id) {
            Some((_, quantity)) => *quantity += usage.quantity,
            None => totals.push((usage.shuttle.clone(), usage.quantity)),
        }
    }
    totals
}
