//! Environment-level validation tests
//!
//! These drive the simulation through its public API and check the
//! structural invariants: grid/vehicle consistency, monotone rows, the
//! pothole cap, rain cleanup, score bounds, and history round-trips.

use lane_sim::simulation::{
    EventLog, FaultKind, SimConfig, SimEnvironment, SimError, SimGrid, VehicleId, MAX_HISTORY,
    MAX_POTHOLES,
};

/// A config with randomness-driven hazards and weather switched off, for
/// tests that need full control of the world.
fn quiet_config(rows: usize, cols: usize, cars: usize) -> SimConfig {
    SimConfig {
        rows,
        cols,
        num_cars_spawn: cars,
        weather_change_chance: 0,
        pothole_chance: 0,
        ..SimConfig::default()
    }
}

/// Every grid handle must resolve to a vehicle sitting exactly there, and
/// every vehicle must be held by exactly its own cell.
fn assert_grid_consistent(environment: &SimEnvironment) {
    let grid = environment.grid();
    let mut occupied = 0;
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            if let Some(id) = grid.get(row, col) {
                occupied += 1;
                let vehicle = environment
                    .vehicle(id)
                    .expect("grid handle must resolve to a live vehicle");
                assert_eq!(
                    (vehicle.row, vehicle.col),
                    (row, col),
                    "grid and vehicle disagree about {id}"
                );
            }
        }
    }
    assert_eq!(
        occupied,
        environment.vehicles().len(),
        "every vehicle occupies exactly one cell"
    );
    for vehicle in environment.vehicles() {
        assert_eq!(grid.get(vehicle.row, vehicle.col), Some(vehicle.id));
    }
}

#[test]
fn test_construction_spawns_configured_vehicles() {
    let environment = SimEnvironment::new_with_seed(SimConfig::default(), 1).unwrap();
    assert_eq!(
        environment.vehicles().len(),
        environment.config().num_cars_spawn
    );
    assert_grid_consistent(&environment);
    assert_eq!(environment.tick(), 0);
    assert_eq!(environment.history_len(), 0);
}

#[test]
fn test_invalid_configs_are_rejected() {
    let zero_rows = SimConfig {
        rows: 0,
        ..SimConfig::default()
    };
    assert!(matches!(
        SimEnvironment::new_with_seed(zero_rows, 1),
        Err(SimError::Configuration(_))
    ));

    let negative_weight = SimConfig {
        safety_weight: -1.0,
        ..SimConfig::default()
    };
    assert!(matches!(
        SimEnvironment::new_with_seed(negative_weight, 1),
        Err(SimError::Configuration(_))
    ));

    let too_many_cars = SimConfig {
        rows: 2,
        cols: 2,
        num_cars_spawn: 5,
        ..SimConfig::default()
    };
    assert!(matches!(
        SimEnvironment::new_with_seed(too_many_cars, 1),
        Err(SimError::Configuration(_))
    ));
}

#[test]
fn test_invariants_hold_across_many_ticks() {
    let config = SimConfig {
        rows: 80,
        cols: 4,
        num_cars_spawn: 8,
        ..SimConfig::default()
    };
    let mut environment = SimEnvironment::new_with_seed(config, 42).unwrap();

    for _ in 0..60 {
        let before: Vec<(VehicleId, usize)> = environment
            .vehicles()
            .iter()
            .map(|v| (v.id, v.row))
            .collect();

        environment.step().unwrap();
        assert_grid_consistent(&environment);

        // Rows never increase; a blocked vehicle holds, nobody backs up.
        for (id, old_row) in before {
            if let Some(vehicle) = environment.vehicle(id) {
                assert!(
                    vehicle.row <= old_row,
                    "{id} moved backwards from {old_row} to {}",
                    vehicle.row
                );
            }
        }

        assert!(
            environment.faults().count_of(FaultKind::Pothole) <= MAX_POTHOLES,
            "pothole cap exceeded"
        );
    }
}

#[test]
fn test_pothole_cap_holds_under_heavy_generation() {
    let config = SimConfig {
        rows: 120,
        cols: 4,
        num_cars_spawn: 8,
        pothole_chance: 100,
        weather_change_chance: 0,
        ..SimConfig::default()
    };
    let mut environment = SimEnvironment::new_with_seed(config, 7).unwrap();
    for _ in 0..100 {
        environment.step().unwrap();
        assert!(environment.faults().count_of(FaultKind::Pothole) <= MAX_POTHOLES);
    }
}

#[test]
fn test_rain_faults_cleared_when_rain_stops() {
    let config = SimConfig {
        rows: 100,
        cols: 3,
        num_cars_spawn: 3,
        weather_change_chance: 100,
        pothole_chance: 0,
        rain_duration: 15,
        ..SimConfig::default()
    };
    let mut environment = SimEnvironment::new_with_seed(config, 11).unwrap();

    let mut saw_stop = false;
    let mut was_raining = false;
    for _ in 0..40 {
        environment.step().unwrap();
        let raining = environment.weather().is_raining;
        if was_raining && !raining {
            assert_eq!(
                environment.faults().count_of(FaultKind::Rain),
                0,
                "rain cells must be dried the tick rain stops"
            );
            saw_stop = true;
            break;
        }
        was_raining = raining;
    }
    assert!(saw_stop, "rain never stopped within the test window");
}

#[test]
fn test_happiness_scores_stay_in_bounds() {
    let config = SimConfig {
        rows: 80,
        cols: 4,
        num_cars_spawn: 8,
        ..SimConfig::default()
    };
    let mut environment = SimEnvironment::new_with_seed(config, 99).unwrap();

    for _ in 0..50 {
        environment.step().unwrap();
        for vehicle in environment.vehicles() {
            for &score in &vehicle.happiness_history {
                assert!(
                    (0.0..=10.01).contains(&score),
                    "composite happiness {score} out of bounds for {}",
                    vehicle.id
                );
            }
            assert!(vehicle.happiness_history.len() <= 10);
        }
    }
}

#[test]
fn test_history_round_trip_restores_everything() {
    let config = SimConfig {
        rows: 60,
        cols: 4,
        num_cars_spawn: 6,
        ..SimConfig::default()
    };
    let mut environment = SimEnvironment::new_with_seed(config, 5).unwrap();
    for _ in 0..3 {
        environment.step().unwrap();
    }

    let grid = environment.grid().clone();
    let faults = environment.faults().clone();
    let weather = environment.weather();
    let vehicles = environment.vehicles().to_vec();
    let events = environment.events().clone();
    let tick = environment.tick();

    environment.step().unwrap();
    environment.rewind().unwrap();

    assert_eq!(*environment.grid(), grid);
    assert_eq!(*environment.faults(), faults);
    assert_eq!(environment.weather(), weather);
    assert_eq!(environment.vehicles(), vehicles.as_slice());
    assert_eq!(*environment.events(), events);
    assert_eq!(environment.tick(), tick);
}

#[test]
fn test_rewind_with_no_history_reports_empty() {
    let mut environment = SimEnvironment::new_with_seed(quiet_config(10, 2, 0), 1).unwrap();
    assert!(matches!(environment.rewind(), Err(SimError::EmptyHistory)));
}

#[test]
fn test_history_is_linear_after_rewind() {
    let mut environment = SimEnvironment::new_with_seed(quiet_config(20, 2, 2), 3).unwrap();
    environment.step().unwrap();
    environment.step().unwrap();
    assert_eq!(environment.history_len(), 2);

    environment.rewind().unwrap();
    assert_eq!(environment.history_len(), 1);
    assert_eq!(environment.tick(), 1);

    // A new step simply continues the stack from the restored point.
    environment.step().unwrap();
    assert_eq!(environment.history_len(), 2);
    assert_eq!(environment.tick(), 2);
}

#[test]
fn test_history_depth_is_capped() {
    let mut environment = SimEnvironment::new_with_seed(quiet_config(8, 1, 1), 2).unwrap();
    for _ in 0..MAX_HISTORY + 40 {
        environment.step().unwrap();
    }
    assert_eq!(environment.history_len(), MAX_HISTORY);
}

#[test]
fn test_ego_is_none_without_vehicles() {
    let mut environment = SimEnvironment::new_with_seed(quiet_config(10, 2, 0), 1).unwrap();
    assert_eq!(environment.evaluate_ego(), None);
    environment.step().unwrap();
    assert_eq!(environment.ego(), None);
}

#[test]
fn test_ego_selection_prefers_first_maximum() {
    use lane_sim::simulation::select_ego;

    let first = VehicleId(0);
    let second = VehicleId(1);
    assert_eq!(select_ego(&[(first, 5.0), (second, 5.0)]), Some(first));
    assert_eq!(select_ego(&[(first, 1.0), (second, 2.0)]), Some(second));
    assert_eq!(select_ego(&[]), None);
}

#[test]
fn test_grid_rejects_double_occupancy() {
    let mut grid = SimGrid::new(5, 2);
    grid.place(VehicleId(0), 4, 0).unwrap();
    assert!(matches!(
        grid.place(VehicleId(1), 4, 0),
        Err(SimError::InvariantViolation(_))
    ));

    // A failed move leaves the grid untouched.
    grid.place(VehicleId(1), 3, 0).unwrap();
    assert!(matches!(
        grid.move_to(VehicleId(0), (4, 0), (3, 0)),
        Err(SimError::InvariantViolation(_))
    ));
    assert_eq!(grid.get(4, 0), Some(VehicleId(0)));
    assert_eq!(grid.get(3, 0), Some(VehicleId(1)));

    // Clearing with the wrong id is caught too.
    assert!(matches!(
        grid.clear(VehicleId(0), 3, 0),
        Err(SimError::InvariantViolation(_))
    ));
}

#[test]
fn test_add_vehicle_on_occupied_cell_fails() {
    let mut environment = SimEnvironment::new_with_seed(quiet_config(10, 2, 0), 1).unwrap();
    environment.add_vehicle(5, 1).unwrap();
    assert!(matches!(
        environment.add_vehicle(5, 1),
        Err(SimError::InvariantViolation(_))
    ));
}

#[test]
fn test_event_log_is_bounded() {
    let mut log = EventLog::new(3);
    for tick in 0..5 {
        log.push(tick, format!("event {tick}"));
    }
    assert_eq!(log.len(), 3);
    assert_eq!(log.latest(), Some("[tick 4] event 4"));
    let oldest = log.iter().next().unwrap();
    assert_eq!(oldest, "[tick 2] event 2");
}
