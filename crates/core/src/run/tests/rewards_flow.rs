use super::support::*;

#[test]
fn a_full_clear_composes_every_bonus_source() {
    let mut run = started_run(47);
    let provider = StockProvider::new(47);
    drive_full_run(&mut run, &provider);

    assert!(run.goal().completed);
    let points = run.points();
    let torches = run.torches();
    let rewards = run.exit_run().expect("exit");

    assert!(rewards.base_gold > 0);
    assert!(rewards.base_exp > 0);
    assert!((rewards.exploration_multiplier - points.multiplier()).abs() < 1e-9);
    assert!((rewards.torch_bonus - torches.fraction() * 0.03).abs() < 1e-9);
    assert!((rewards.goal_bonus - 0.5).abs() < 1e-9);
    let expected_total =
        rewards.exploration_multiplier + rewards.torch_bonus + rewards.goal_bonus;
    assert!((rewards.total_multiplier - expected_total).abs() < 1e-9);
    assert_eq!(
        rewards.final_gold,
        (f64::from(rewards.base_gold) * rewards.total_multiplier).round() as u32
    );
    assert_eq!(
        rewards.final_exp,
        (f64::from(rewards.base_exp) * rewards.total_multiplier).round() as u32
    );
}

#[test]
fn the_forecast_matches_the_exit_and_mutates_nothing() {
    let mut run = started_run(53);
    let provider = StockProvider::new(53);
    drive_full_run(&mut run, &provider);

    let hash_before = run.snapshot_hash();
    let forecast = run.predict_rewards();
    assert_eq!(run.snapshot_hash(), hash_before, "prediction must not touch run state");

    let rewards = run.exit_run().expect("exit");
    assert_eq!(forecast.rewards.final_gold, rewards.final_gold);
    assert_eq!(forecast.rewards.final_exp, rewards.final_exp);
    assert!((forecast.rewards.total_multiplier - rewards.total_multiplier).abs() < 1e-9);
    // Loot rides on the exit itself, not the forecast.
    assert!(forecast.rewards.items.is_empty());
}

#[test]
fn an_early_exit_forfeits_the_goal_bonus() {
    let mut run = started_run(61);
    let provider = StockProvider::new(61);

    let first = run.room_order()[0];
    run.enter_room(first, &provider).expect("start enters");
    let rewards = run.exit_run().expect("exit");
    assert!((rewards.goal_bonus - 0.0).abs() < 1e-9);
    assert!(rewards.torch_bonus > 0.0, "an untouched pool still earns its bonus");
}

#[test]
fn abort_is_terminal_and_logged() {
    let mut run = started_run(67);
    let provider = StockProvider::new(67);
    run.abort();

    assert!(run.finished());
    assert!(run.log().iter().any(|event| matches!(event, LogEvent::RunAborted)));
    let start = run.room_order()[0];
    assert_eq!(run.enter_room(start, &provider).unwrap_err(), EngineError::RunFinished);
    assert_eq!(run.exit_run().unwrap_err(), EngineError::RunFinished);
}

#[test]
fn advisory_queries_never_gate_progression() {
    let mut run = started_run(71);
    let provider = StockProvider::new(71);

    for room_id in run.room_order().to_vec() {
        // Whatever the advisory says, entry keeps working.
        let _ = run.exit_risk();
        let _ = run.exit_recommendation();
        let result = run.enter_room(room_id, &provider).expect("enter");
        if result.sub_flow.is_some() {
            run.resolve_room().expect("resolve");
        }
    }
    assert_eq!(run.rooms_remaining(), 0);
    assert_eq!(run.exit_recommendation(), crate::rewards::ExitRecommendation::ExitNow);
}

#[test]
fn snapshots_round_trip_through_json_and_preserve_the_hash() {
    let mut run = started_run(83);
    let provider = StockProvider::new(83);
    for room_id in run.room_order().to_vec().into_iter().take(4) {
        let result = run.enter_room(room_id, &provider).expect("enter");
        if result.sub_flow.is_some() {
            run.resolve_room().expect("resolve");
        }
    }

    let snapshot = run.snapshot().expect("snapshot");
    let encoded = serde_json::to_string(&snapshot).expect("encode");
    let decoded: RunSnapshot = serde_json::from_str(&encoded).expect("decode");
    let restored = ExpeditionRun::from_snapshot(&decoded).expect("restore");

    assert_eq!(restored.snapshot_hash(), run.snapshot_hash());
    assert_eq!(restored.goal(), run.goal());
    assert_eq!(restored.torches(), run.torches());
    assert_eq!(restored.points(), run.points());
}

#[test]
fn snapshots_are_refused_while_a_room_is_in_flight() {
    let (mut run, combat_id) = run_containing(RoomKind::Combat);
    let provider = StockProvider::new(run.seed());

    run.enter_room(combat_id, &provider).expect("combat enters");
    assert_eq!(run.snapshot().unwrap_err(), EngineError::RoomInFlight);
    run.resolve_room().expect("resolve");
    assert!(run.snapshot().is_ok());
}

#[test]
fn corrupt_snapshots_are_rejected_with_reasons() {
    let run = started_run(89);
    let mut snapshot = run.snapshot().expect("snapshot");
    snapshot.torches = snapshot.max_torches + 1;
    assert!(matches!(
        ExpeditionRun::from_snapshot(&snapshot).unwrap_err(),
        EngineError::CorruptSnapshot(_)
    ));

    let mut snapshot = run.snapshot().expect("snapshot");
    snapshot.tier_id = 200;
    assert_eq!(
        ExpeditionRun::from_snapshot(&snapshot).unwrap_err(),
        EngineError::UnknownTier(200)
    );

    let mut snapshot = run.snapshot().expect("snapshot");
    snapshot.affixes.push("affix_of_imaginary_numbers".to_string());
    assert!(matches!(
        ExpeditionRun::from_snapshot(&snapshot).unwrap_err(),
        EngineError::UnknownAffix(_)
    ));
}
