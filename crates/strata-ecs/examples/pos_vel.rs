//! Minimal demo: two entities, positions and velocities.
//!
//! Run with: `cargo run --example pos_vel`
//! Set `RUST_LOG=trace` to watch pools being created.

use strata_ecs::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug)]
struct Velocity {
    x: f32,
    y: f32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut registry = Registry::new();

    let ent1 = registry.create();
    let ent2 = registry.create();

    registry.add(ent1, Position { x: 10.0, y: 25.0 });
    registry.emplace(ent1, || Velocity { x: 10.0, y: 2.0 });
    registry.emplace(ent2, || Position { x: 42.0, y: 21.0 });
    registry.emplace(ent2, || Velocity { x: 21.0, y: 9.0 });

    println!("position of ent1: {:?}", registry.get::<Position>(ent1));
    println!("velocity of ent2: {:?}", registry.get::<Velocity>(ent2));

    // One integration step over every entity that can move.
    registry.view::<(Position, Velocity)>().each(|entity, pos, vel| {
        pos.x += vel.x;
        pos.y += vel.y;
        println!("moved {entity} to ({}, {})", pos.x, pos.y);
    });

    println!("ent1 has Position? {}", registry.has::<Position>(ent1));
    registry.remove::<Position>(ent1);
    println!(
        "ent1 has Position after removing it? {}",
        registry.has::<Position>(ent1)
    );

    registry.destroy(ent2);
    println!(
        "ent2 has Velocity after being destroyed? {}",
        registry.has::<Velocity>(ent2)
    );
}
