use attractors::{Attractor, Integrator, Method, OdeBuilder, OdeSolverMethod, Parameters, Window};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn criterion_benchmark(c: &mut Criterion) {
    let lorenz = Parameters::preset(Attractor::Lorenz);
    let y0 = Attractor::Lorenz.preset_initial_state();

    macro_rules! bench_integrator {
        ($name:ident, $method:expr) => {
            c.bench_function(stringify!($name), |b| {
                let integrator = Integrator::builder().method($method).build();
                b.iter(|| {
                    integrator
                        .integrate_attractor(&lorenz, black_box(y0), Window::default())
                        .unwrap()
                })
            });
        };
    }

    bench_integrator!(bdf_lorenz_default_window, Method::Bdf);
    bench_integrator!(tsit45_lorenz_default_window, Method::Tsit45);

    // stepping only, without sampling onto a grid
    macro_rules! bench_solve {
        ($name:ident, $solver:ident) => {
            c.bench_function(stringify!($name), |b| {
                b.iter(|| {
                    let problem = OdeBuilder::new().init(y0).build(lorenz).unwrap();
                    let mut solver = problem.$solver().unwrap();
                    solver.solve(black_box(100.0)).unwrap()
                })
            });
        };
    }

    bench_solve!(bdf_lorenz_solve, bdf);
    bench_solve!(tsit45_lorenz_solve, tsit45);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
