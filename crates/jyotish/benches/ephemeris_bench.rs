use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jyotish::ephemeris::{AnalyticalEphemeris, Body, EphemerisProvider};
use jyotish::houses::{HouseCuspCalculator, HouseRequest};
use jyotish::sidereal::SiderealTimeCalculator;
use jyotish::time::J2000;
use jyotish::{BirthInput, ChartEngine, GeoLocation};

fn bench_analytical_positions(c: &mut Criterion) {
    let eph = AnalyticalEphemeris::new();
    c.bench_function("analytical_all_bodies", |b| {
        b.iter(|| {
            for body in Body::COMPUTED {
                let _ = eph.tropical_longitude(black_box(J2000 + 1234.5), body);
            }
        })
    });

    let provider = EphemerisProvider::analytical_only();
    c.bench_function("provider_moon", |b| {
        b.iter(|| provider.position(black_box(J2000 + 42.0), Body::Moon))
    });
}

fn bench_houses(c: &mut Criterion) {
    let calc = HouseCuspCalculator::new(None, SiderealTimeCalculator::default(), true);
    let request = HouseRequest {
        jd: J2000,
        location: Some(GeoLocation { lat: 40.7128, lon: -74.0060 }),
        ayanamsa: 23.85,
        sun_sidereal: None,
        clock_hours: 12.0,
    };
    c.bench_function("placidus_approximation", |b| {
        b.iter(|| calc.calculate(black_box(&request)))
    });
}

fn bench_full_chart(c: &mut Criterion) {
    let engine = ChartEngine::analytical_only();
    let input = BirthInput::new(
        NaiveDate::from_ymd_opt(1990, 5, 17)
            .and_then(|d| d.and_hms_opt(4, 45, 0))
            .unwrap(),
        19.076,
        72.8777,
        "Asia/Kolkata",
    );
    c.bench_function("natal_chart", |b| b.iter(|| engine.compute(black_box(&input))));
}

criterion_group!(benches, bench_analytical_positions, bench_houses, bench_full_chart);
criterion_main!(benches);
