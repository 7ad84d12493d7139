//! End-to-end runs through the public simulator API

use fleetsim_core::{MemorySink, SimEvent};
use fleetsim_engine::{
    FixedPolicy, PolicyKind, RunConfig, ScriptedArrivals, SimulationConfig, Simulator,
    ThresholdPolicy,
};

fn seeded_config(servers: i64, ticks: i64, seed: u64) -> SimulationConfig {
    SimulationConfig::new(RunConfig::try_new(servers, ticks).unwrap()).with_seed(seed)
}

/// Split a flat event stream into per-tick slices (each ending in its summary)
fn ticks(events: &[SimEvent]) -> Vec<&[SimEvent]> {
    events
        .split_inclusive(|e| matches!(e, SimEvent::TickSummary { .. }))
        .collect()
}

#[test]
fn test_zero_ticks_leaves_pool_untouched() {
    let mut simulator = Simulator::new(seeded_config(1, 0, 5)).unwrap();
    let mut sink = MemorySink::new();

    let result = simulator.run(&mut sink).unwrap();

    assert_eq!(sink.count("tick_summary"), 0);
    assert_eq!(result.final_pool_size, 1);
    assert_eq!(simulator.pool().size(), 1);
}

#[test]
fn test_floor_holds_every_tick() {
    for seed in 0..5 {
        let mut simulator = Simulator::new(seeded_config(3, 300, seed)).unwrap();
        let mut sink = MemorySink::new();

        while simulator.step(&mut sink).unwrap() {
            assert!(
                simulator.pool().size() >= 3,
                "pool fell below floor at tick {}",
                simulator.current_tick()
            );
        }
        assert_eq!(sink.count("tick_summary"), 300);
    }
}

#[test]
fn test_same_seed_same_event_stream() {
    let run = |seed| {
        let mut simulator = Simulator::new(seeded_config(2, 50, seed)).unwrap();
        let mut sink = MemorySink::new();
        let result = simulator.run(&mut sink).unwrap();
        (sink.into_events(), result)
    };

    let (events_a, result_a) = run(99);
    let (events_b, result_b) = run(99);

    assert_eq!(events_a, events_b);
    assert_eq!(result_a, result_b);
}

#[test]
fn test_event_order_within_each_tick() {
    let mut simulator = Simulator::new(seeded_config(2, 80, 17)).unwrap();
    let mut sink = MemorySink::new();
    simulator.run(&mut sink).unwrap();

    for (i, tick_events) in ticks(sink.events()).into_iter().enumerate() {
        // dispatch < resize < new_request < summary
        let phase = |e: &SimEvent| match e {
            SimEvent::Dispatch { .. } => 0,
            SimEvent::ServerAdded { .. } | SimEvent::ServerRemoved { .. } => 1,
            SimEvent::NewRequest { .. } => 2,
            SimEvent::TickSummary { .. } => 3,
        };
        let phases: Vec<u8> = tick_events.iter().map(phase).collect();
        assert!(phases.windows(2).all(|w| w[0] <= w[1]), "out of order in tick {}", i + 1);

        // Never grow and shrink in the same tick
        let added = tick_events.iter().any(|e| matches!(e, SimEvent::ServerAdded { .. }));
        let removed = tick_events.iter().any(|e| matches!(e, SimEvent::ServerRemoved { .. }));
        assert!(!(added && removed));

        assert_eq!(
            tick_events.last().map(SimEvent::kind),
            Some("tick_summary")
        );
        if let Some(SimEvent::TickSummary { tick, .. }) = tick_events.last() {
            assert_eq!(*tick, i as u64 + 1);
        }
    }
}

#[test]
fn test_dispatch_drains_min_of_depth_and_pool() {
    let mut simulator = Simulator::new(seeded_config(4, 60, 3)).unwrap();
    let mut sink = MemorySink::new();

    loop {
        let depth_before = simulator.queue().size();
        let pool_before = simulator.pool().size();
        let seen = sink.events().len();

        if !simulator.step(&mut sink).unwrap() {
            break;
        }

        let dispatched = sink.events()[seen..]
            .iter()
            .filter(|e| matches!(e, SimEvent::Dispatch { .. }))
            .count();
        assert_eq!(dispatched, depth_before.min(pool_before));
        assert!(simulator.pool().workers().iter().all(|w| w.is_available()));
    }
}

#[test]
fn test_queue_summary_matches_queue() {
    let mut simulator = Simulator::new(seeded_config(1, 25, 8)).unwrap();
    let mut sink = MemorySink::new();

    while simulator.step(&mut sink).unwrap() {
        let last = sink.events().last().cloned();
        assert_eq!(
            last,
            Some(SimEvent::TickSummary {
                tick: simulator.current_tick(),
                queue_size: simulator.queue().size(),
            })
        );
    }
}

#[test]
fn test_growth_then_decay_with_scripted_load() {
    // 3 servers, 45 queued, burst for 5 ticks then silence
    let mut config = SimulationConfig::new(RunConfig::try_new(3, 30).unwrap());
    config.arrivals.backlog_per_server = 15;
    let mut simulator = Simulator::with_parts(
        config,
        Box::new(ThresholdPolicy::new()),
        Box::new(ScriptedArrivals::new(vec![30, 30, 30, 30, 30])),
    )
    .unwrap();
    let mut sink = MemorySink::new();

    let result = simulator.run(&mut sink).unwrap();

    assert!(result.peak_pool_size > 3);
    assert_eq!(result.final_pool_size, 3);
    assert_eq!(result.final_queue_size, 0);
    assert_eq!(result.total_arrivals, 150);
    assert_eq!(result.total_dispatched, 195);
    assert_eq!(sink.count("new_request"), 150);
}

#[test]
fn test_threshold_outperforms_fixed_on_backlog() {
    let make = |fixed: bool| {
        let mut config = SimulationConfig::new(RunConfig::try_new(2, 100).unwrap()).with_seed(4);
        if fixed {
            config.policy.kind = PolicyKind::Fixed;
        }
        let mut simulator = Simulator::new(config).unwrap();
        simulator.run(&mut MemorySink::new()).unwrap()
    };

    let threshold = make(false);
    let fixed = make(true);

    assert_eq!(fixed.final_pool_size, 2);
    assert!(threshold.total_dispatched > fixed.total_dispatched);
    assert!(threshold.final_queue_size < fixed.final_queue_size);
}

#[test]
fn test_fixed_policy_with_scripted_parts() {
    let config = SimulationConfig::new(RunConfig::try_new(5, 3).unwrap());
    let mut simulator = Simulator::with_parts(
        config,
        Box::new(FixedPolicy::new()),
        Box::new(ScriptedArrivals::new(vec![])),
    )
    .unwrap();
    let mut sink = MemorySink::new();

    let result = simulator.run(&mut sink).unwrap();

    // 500 backlog, 5 per tick for 3 ticks
    assert_eq!(result.total_dispatched, 15);
    assert_eq!(result.final_queue_size, 485);
    assert_eq!(result.average_queue_size, (495.0 + 490.0 + 485.0) / 3.0);
}
