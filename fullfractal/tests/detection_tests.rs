use std::sync::{Arc, Mutex};

use chrono::{Timelike, Utc};

use fullfractal::{
    Bar, BarSeries, FractalError, FractalEvent, FractalService, HighLowSeries, PriceSeries, Side,
};

fn scenario_a() -> HighLowSeries {
    HighLowSeries::new(
        vec![10.0, 11.0, 12.0, 13.0, 15.0, 13.0, 12.0, 11.0, 10.0, 11.0, 13.0, 15.0, 14.0],
        vec![5.0, 4.0, 3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 5.0, 3.0, 1.0, 0.0, 2.0],
    )
}

type Seen = Arc<Mutex<Vec<(usize, usize, Side, f64)>>>;

fn record_events(service: &mut FractalService) -> Seen {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    service.subscribe(move |event: &FractalEvent<'_>| {
        sink.lock().expect("events mutex poisoned").push((
            event.originating_index,
            event.fractal.index(),
            event.fractal.side(),
            event.fractal.value(),
        ));
    });
    seen
}

#[test]
fn simultaneous_low_and_high_dispatch_low_first() {
    let series = scenario_a();
    let mut service = FractalService::with_period(5).expect("valid period");
    let seen = record_events(&mut service);

    let detected = service.process(&series, 6).expect("in range");

    assert_eq!(detected, 2);
    let seen = seen.lock().expect("events mutex poisoned").clone();
    assert_eq!(seen, vec![(6, 4, Side::Low, 1.0), (6, 4, Side::High, 15.0)]);
    assert_eq!(service.sequence().len(), 2);
    assert_eq!(service.last_fractal(false).map(|x| x.side()), Some(Side::High));
}

#[test]
fn full_scenario_series_only_yields_the_index_four_pair() {
    let series = scenario_a();
    let mut service = FractalService::with_period(5).expect("valid period");

    let mut total = 0;
    for index in 0..series.len() {
        total += service.process(&series, index).expect("in range");
    }

    assert_eq!(total, 2);
    let low = service.last_low_fractal(true).expect("low detected");
    let high = service.last_high_fractal(true).expect("high detected");
    assert_eq!((low.index(), low.value()), (4, 1.0));
    assert_eq!((high.index(), high.value()), (4, 15.0));
}

#[test]
fn insufficient_history_is_silent() {
    let series = scenario_a();
    let mut service = FractalService::with_period(5).expect("valid period");

    assert_eq!(service.process(&series, 4).expect("no-op"), 0);
    assert!(service.sequence().is_empty());
    assert!(service.last_fractal(true).is_none());
    assert!(service.last_high_fractal(true).is_none());
    assert!(service.last_low_fractal(false).is_none());
    assert_eq!(service.last_processed(), None);
}

#[test]
fn window_past_series_end_is_an_error() {
    let series = scenario_a();
    let mut service = FractalService::with_period(5).expect("valid period");

    let err = service.process(&series, 13).expect_err("beyond series");
    assert!(matches!(err, FractalError::OutOfRange { index: 13, len: 13 }));
    assert!(service.sequence().is_empty());
    assert_eq!(service.last_processed(), None);
}

#[test]
fn repeated_index_is_skipped_and_lower_index_rejected() {
    let series = scenario_a();
    let mut service = FractalService::with_period(5).expect("valid period");

    assert_eq!(service.process(&series, 6).expect("in range"), 2);
    assert_eq!(service.process(&series, 6).expect("repeat"), 0);
    assert_eq!(service.sequence().len(), 2);

    let err = service.process(&series, 5).expect_err("backwards");
    assert!(matches!(err, FractalError::OutOfOrder { index: 5, last: 6 }));
}

#[test]
fn backwards_index_is_rejected_even_below_period() {
    let series = scenario_a();
    let mut service = FractalService::with_period(5).expect("valid period");
    service.process(&series, 8).expect("in range");

    for index in [3, 7] {
        let err = service.process(&series, index).expect_err("backwards");
        assert!(matches!(err, FractalError::OutOfOrder { last: 8, .. }));
    }
    assert_eq!(service.last_processed(), Some(8));
}

#[test]
fn listener_sees_node_already_linked() {
    let series = scenario_a();
    let mut service = FractalService::with_period(5).expect("valid period");
    let links: Arc<Mutex<Vec<(Side, usize, Option<(usize, Side)>)>>> =
        Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&links);
    service.subscribe(move |event: &FractalEvent<'_>| {
        let fractal = event.fractal;
        let previous = fractal.previous(false).map(|x| (x.index(), x.side()));
        assert!(fractal.next(false).is_none(), "dispatched node must be the tail");
        let mut linked = 1;
        let mut cursor = fractal.previous(false);
        while let Some(x) = cursor {
            linked += 1;
            cursor = x.previous(false);
        }
        sink.lock()
            .expect("links mutex poisoned")
            .push((fractal.side(), linked, previous));
    });

    service.process(&series, 6).expect("in range");

    let links = links.lock().expect("links mutex poisoned").clone();
    assert_eq!(
        links,
        vec![
            (Side::Low, 1, None),
            (Side::High, 2, Some((4, Side::Low))),
        ]
    );
}

#[test]
fn removal_through_service_keeps_later_detections_linked() {
    let series = sample_series(200);
    let mut service = FractalService::with_period(5).expect("valid period");
    assert_eq!(service.options().period, 5);

    let mut index = 0;
    while service.sequence().len() < 3 {
        service.process(&series, index).expect("in range");
        index += 1;
    }
    let tail = service.last_fractal(false).expect("tail").id();
    let before = service.sequence().len();
    service.sequence_mut().remove(tail).expect("attached tail");
    assert_eq!(service.sequence().len(), before - 1);
    assert!(service.sequence().get(tail).is_none());

    for next in index..series.len() {
        service.process(&series, next).expect("in range");
    }
    assert!(service.sequence().len() > before);

    let forward: Vec<usize> = service.sequence().iter().map(|x| x.index()).collect();
    assert!(forward.windows(2).all(|w| w[0] <= w[1]), "{forward:?}");
    let mut backward = Vec::new();
    let mut cursor = service.sequence().last();
    while let Some(fractal) = cursor {
        backward.push(fractal.index());
        cursor = fractal.previous(false);
    }
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn non_finite_price_in_window_is_rejected() {
    let series = HighLowSeries::new(
        vec![1.0, 2.0, 3.0, f64::NAN, 3.0, 2.0, 1.0],
        vec![0.0, 1.0, 2.0, 2.5, 2.0, 1.0, 0.0],
    );
    let mut service = FractalService::with_period(5).expect("valid period");

    let err = service.process(&series, 5).expect_err("nan high");
    assert!(matches!(
        err,
        FractalError::NonFinite {
            index: 3,
            side: Side::High
        }
    ));
    assert!(service.sequence().is_empty());
    assert_eq!(service.last_processed(), None);
}

#[test]
fn period_below_minimum_is_rejected() {
    assert!(matches!(
        FractalService::with_period(4),
        Err(FractalError::InvalidPeriod(4))
    ));
}

#[test]
fn even_period_uses_rounded_down_half() {
    let service = FractalService::with_period(6).expect("valid period");
    assert_eq!(service.period(), 6);
    assert_eq!(service.half_period(), 3);
    assert_eq!(service.middle_index(10), Some(7));
    assert_eq!(service.middle_index(2), None);
}

#[test]
fn flat_window_yields_both_sides_at_middle() {
    let series = HighLowSeries::new(vec![7.0; 8], vec![3.0; 8]);
    let mut service = FractalService::with_period(5).expect("valid period");
    let seen = record_events(&mut service);

    assert_eq!(service.process(&series, 5).expect("in range"), 2);
    let seen = seen.lock().expect("events mutex poisoned").clone();
    assert_eq!(seen, vec![(5, 3, Side::Low, 3.0), (5, 3, Side::High, 7.0)]);
}

#[test]
fn unsubscribed_listener_stops_receiving() {
    let series = sample_series(80);
    let mut service = FractalService::with_period(5).expect("valid period");
    let calls = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&calls);
    let id = service.subscribe(move |_: &FractalEvent<'_>| {
        *sink.lock().expect("calls mutex poisoned") += 1;
    });

    let mut detected = 0;
    for index in 0..40 {
        detected += service.process(&series, index).expect("in range");
    }
    assert!(detected > 0);
    assert_eq!(*calls.lock().expect("calls mutex poisoned"), detected);

    assert!(service.unsubscribe(id));
    for index in 40..80 {
        service.process(&series, index).expect("in range");
    }
    assert_eq!(*calls.lock().expect("calls mutex poisoned"), detected);
}

#[test]
fn sequence_stays_in_index_order_while_streaming() {
    fullfractal::init_logging();
    let series = sample_series(240);
    let mut service = FractalService::with_period(7).expect("valid period");
    let seen = record_events(&mut service);

    for index in 0..series.len() {
        service.process(&series, index).expect("in range");
        let indices: Vec<usize> = service.sequence().iter().map(|x| x.index()).collect();
        assert!(
            indices.windows(2).all(|w| w[0] <= w[1]),
            "unordered at process({index}): {indices:?}"
        );
    }

    let seen = seen.lock().expect("events mutex poisoned").clone();
    assert!(seen.len() > 10, "need enough fractals: {}", seen.len());
    for (origin, index, _, _) in &seen {
        assert_eq!(origin - index, service.half_period());
    }
    assert_eq!(seen.len(), service.sequence().len());
}

#[test]
fn detected_values_are_window_extremes() {
    let series = sample_series(160);
    let mut service = FractalService::with_period(5).expect("valid period");
    for index in 0..series.len() {
        service.process(&series, index).expect("in range");
    }

    let half = service.half_period();
    for fractal in service.sequence() {
        let window = (fractal.index() - half)..=(fractal.index() + half);
        for offset in window {
            match fractal.side() {
                Side::High => assert!(series.high(offset).expect("in range") <= fractal.value()),
                Side::Low => assert!(series.low(offset).expect("in range") >= fractal.value()),
            }
        }
    }
}

#[test]
fn dataframe_snapshot_has_one_row_per_fractal() {
    let series = scenario_a();
    let mut service = FractalService::with_period(5).expect("valid period");
    service.process(&series, 6).expect("in range");

    let frame = service.dataframe().expect("dataframe");
    assert_eq!(frame.height(), 2);
    assert_eq!(
        frame.get_column_names(),
        vec!["index", "value", "side", "best", "fractal_type"]
    );
}

fn sample_series(count: usize) -> BarSeries {
    let base_dt = Utc::now()
        .with_second(0)
        .and_then(|x| x.with_nanosecond(0))
        .expect("valid dt");

    let mut series = BarSeries::new();
    let mut price = 100.0_f64;
    let cycle = [0.0_f64, 3.1, -2.9, 4.2, -3.3, 2.0, -1.7, 3.5, -2.6, 1.4, 0.8, -4.1];
    for i in 0..count {
        let open = price;
        let drift = ((i as f64) * 0.11).sin() * 6.0;
        let close = (100.0 + drift + cycle[i % cycle.len()]).max(1.0);
        price = close;
        series.push(Bar {
            datetime: base_dt + chrono::Duration::minutes((i as i64) * 15),
            open_price: open,
            high_price: open.max(close) + 0.9,
            low_price: open.min(close) - 0.9,
            close_price: close,
            volume: 100.0 + i as f64,
        });
    }
    series
}
