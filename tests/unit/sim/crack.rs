use super::*;
use crate::foundation::core::WorldSize;
use crate::render::canvas::Canvas;

fn field(w: u32, h: u32, seed: u64) -> Field {
    Field {
        grid: Grid::new(WorldSize::new(w, h).unwrap()),
        random: SeededRandom::new(seed),
        seeds: Vec::new(),
    }
}

fn heading_east(x: f64, y: f64) -> Crack {
    Crack {
        position: Point::new(x, y),
        direction: 0.0,
        direction_step: 0.0,
        active: true,
        painter: None,
    }
}

fn index(field: &Field, x: i64, y: i64) -> usize {
    field.grid.world().index_of(x, y).unwrap()
}

#[test]
fn empty_cell_is_claimed_with_rounded_direction() {
    let opts = SceneOptions::default();
    let mut f = field(20, 20, 1);
    let mut crack = heading_east(10.0, 10.0);
    assert_eq!(crack.step(&mut f, &opts), StepOutcome::Advanced);
    assert_eq!(f.grid.get(index(&f, 10, 10)), 0);
    assert!((crack.position().x - 10.1).abs() < 1e-12);
}

#[test]
fn near_parallel_cell_is_reclaimed() {
    let opts = SceneOptions::default();
    let mut f = field(20, 20, 1);
    let i = index(&f, 10, 10);
    f.grid.claim(i, 1.0);
    let mut crack = heading_east(10.0, 10.0);
    assert_eq!(crack.step(&mut f, &opts), StepOutcome::Advanced);
    assert_eq!(f.grid.get(i), 0);
}

#[test]
fn three_degree_difference_stalls_without_claiming() {
    let opts = SceneOptions::default();
    let mut f = field(20, 20, 1);
    let i = index(&f, 10, 10);
    f.grid.claim(i, 3.0);
    let before = f.grid.clone();

    let mut crack = heading_east(10.0, 10.0);
    assert_eq!(crack.step(&mut f, &opts), StepOutcome::Stalled);
    assert_eq!(f.grid, before);
    assert!(crack.is_active());
    assert_eq!(crack.direction(), 0.0);
}

#[test]
fn crossing_crack_triggers_respawn() {
    let opts = SceneOptions::default();
    let mut f = field(20, 20, 1);
    let i = index(&f, 10, 10);
    f.grid.claim(i, 90.0);

    let mut crack = heading_east(10.0, 10.0);
    assert_eq!(crack.step(&mut f, &opts), StepOutcome::Respawned);
    assert_eq!(f.grid.get(i), 90);
    // The only claimed cell is (10, 10), so the crack restarts right next to it.
    let p = crack.position();
    let d = ((p.x - 10.0).powi(2) + (p.y - 10.0).powi(2)).sqrt();
    assert!((d - opts.spawn_distance).abs() < 1e-9);
}

#[test]
fn leaving_the_world_triggers_respawn() {
    let opts = SceneOptions::default();
    let mut f = field(10, 10, 3);
    let seed_cell = index(&f, 2, 2);
    f.grid.claim(seed_cell, 45.0);

    let mut crack = heading_east(9.45, 5.0);
    assert_eq!(crack.step(&mut f, &opts), StepOutcome::Respawned);
    assert_eq!(f.grid.claimed_count(), 1);
    let p = crack.position();
    assert!((p.x - 2.0).abs() <= opts.spawn_distance + 1e-9);
    assert!((p.y - 2.0).abs() <= opts.spawn_distance + 1e-9);
}

#[test]
fn dormant_crack_waits_for_a_claimed_cell() {
    let opts = SceneOptions::default();
    let palette = Palette::new(0);
    let mut f = field(10, 10, 9);

    let mut crack = Crack::spawn(&mut f, &opts, &palette, false);
    assert!(!crack.is_active());
    assert_eq!(crack.step(&mut f, &opts), StepOutcome::Stalled);
    assert!(!crack.is_active());

    let i = index(&f, 4, 4);
    f.grid.claim(i, 10.0);
    assert_eq!(crack.step(&mut f, &opts), StepOutcome::Stalled);
    assert!(crack.is_active());
}

#[test]
fn initial_cracks_start_beside_seed_cells() {
    let opts = SceneOptions::default();
    let palette = Palette::new(0);
    let mut f = field(50, 50, 11);
    let i = index(&f, 25, 30);
    f.grid.claim(i, 200.0);
    f.seeds = vec![i];

    let crack = Crack::spawn(&mut f, &opts, &palette, true);
    assert!(crack.is_active());
    let p = crack.position();
    let d = ((p.x - 25.0).powi(2) + (p.y - 30.0).powi(2)).sqrt();
    assert!((d - opts.spawn_distance).abs() < 1e-9);
    assert!(crack.painter().is_some());
}

#[test]
fn spawn_consumes_the_seeded_stream_identically() {
    let opts = SceneOptions {
        curve_chance: 0.5,
        ..SceneOptions::default()
    };
    let palette = Palette::new(2);
    let mut a = field(40, 40, 77);
    let mut b = field(40, 40, 77);
    for f in [&mut a, &mut b] {
        let i = index(f, 20, 20);
        f.grid.claim(i, 33.0);
    }

    for _ in 0..8 {
        let ca = Crack::spawn(&mut a, &opts, &palette, false);
        let cb = Crack::spawn(&mut b, &opts, &palette, false);
        assert_eq!(ca.position(), cb.position());
        assert_eq!(ca.direction(), cb.direction());
        assert_eq!(ca.direction_step(), cb.direction_step());
        assert_eq!(ca.painter(), cb.painter());
    }
    assert_eq!(a.random.next_float(), b.random.next_float());
}

#[test]
fn perpendicular_preference_branches_at_right_angles() {
    let opts = SceneOptions::default();
    assert_eq!(opts.prefer_direction, opts.spawn_perpendicular);
    let mut random = SeededRandom::new(5);
    for _ in 0..200 {
        let offset = branch_offset(&mut random, &opts).abs();
        assert!((88.0..=92.0).contains(&offset), "offset {offset}");
    }
}

#[test]
fn single_angle_preference_avoids_the_extra_quarter_turn_on_one_side() {
    let opts = SceneOptions {
        prefer_direction: 30.0,
        prefer_single_angle: true,
        ..SceneOptions::default()
    };
    let mut random = SeededRandom::new(5);
    for _ in 0..200 {
        let offset = branch_offset(&mut random, &opts);
        let near_prefer = (offset.abs() - 30.0).abs() <= 2.0;
        let near_quarter = (offset - 120.0).abs() <= 2.0;
        assert!(near_prefer || near_quarter, "offset {offset}");
    }
}

#[test]
fn open_space_scan_stops_at_claimed_cells_and_world_edge() {
    let mut f = field(10, 10, 1);
    let crack = Crack {
        direction: 0.0,
        ..heading_east(5.0, 5.0)
    };
    let far = crack.open_space_extent(&f.grid);
    assert!((far.x - 5.0).abs() < 1e-9);
    assert!(far.y < -0.5 && far.y > -1.4);

    let i = index(&f, 5, 2);
    f.grid.claim(i, 0.0);
    let far = crack.open_space_extent(&f.grid);
    assert!((far.y - (5.0 - 4.0 * 0.81)).abs() < 1e-9);
}

#[test]
fn draw_paints_only_with_a_painter() {
    let opts = SceneOptions::default();
    let palette = Palette::new(0);
    let lookup = SandLookup::new(opts.sand_painter_grains).unwrap();
    let mut f = field(30, 30, 4);
    let i = index(&f, 15, 15);
    f.grid.claim(i, 0.0);
    f.seeds = vec![i];

    let mut bare = heading_east(15.0, 15.0);
    let mut canvas = Canvas::new(30, 30).unwrap();
    bare.draw(&f.grid, &mut canvas, &lookup, CosmeticRandom, (0, 0));
    assert!(canvas.data().iter().all(|&b| b == 0));

    let mut crack = Crack::spawn(&mut f, &opts, &palette, true);
    crack.draw(&f.grid, &mut canvas, &lookup, CosmeticRandom, (0, 0));
    assert!(canvas.data().iter().any(|&b| b != 0));
}
