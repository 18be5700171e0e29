use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use engine_core::RulesEngine;
use games_tictactoe::{Action, State, TicTacToe};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn bench_legal_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("tictactoe_legal_moves");
    let game = TicTacToe::new();
    let opening = game.initial_position();
    let midgame = [4u8, 0, 8, 2]
        .iter()
        .fold(opening, |state, &pos| game.apply(&state, &Action::Place(pos)));

    group.bench_function("opening", |b| b.iter(|| game.legal_moves(&opening)));
    group.bench_function("midgame", |b| b.iter(|| game.legal_moves(&midgame)));
    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("tictactoe_apply");
    group.bench_function("apply_center", |b| {
        let game = TicTacToe::new();
        let base_state = game.initial_position();
        b.iter_batched(
            || base_state,
            |state| game.apply(&state, &Action::Place(4)),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_random_playout(c: &mut Criterion) {
    let mut group = c.benchmark_group("tictactoe_playout");
    group.bench_function("uniform_random", |b| {
        let game = TicTacToe::new();
        b.iter_batched(
            || ChaCha20Rng::seed_from_u64(42),
            |mut rng| {
                let mut state = game.initial_position();
                while !game.is_terminal(&state) {
                    let moves = game.legal_moves(&state);
                    let Some(mv) = moves.choose(&mut rng) else {
                        break;
                    };
                    state = game.apply(&state, mv);
                }
                game.result(&state)
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("tictactoe_snapshot");
    group.bench_function("roundtrip", |b| {
        let game = TicTacToe::new();
        let state = State::new().make_move(4).make_move(0);
        b.iter(|| {
            let snapshot = game.encode(&state);
            game.decode(&snapshot)
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_legal_moves,
    bench_apply,
    bench_random_playout,
    bench_encode_decode
);
criterion_main!(benches);
