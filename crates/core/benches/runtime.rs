use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nx_core::types::Frame;
use nx_core::{Core, CoreDelegate, CoreError, InputSnapshot, Runtime, SourceLine};
use std::cell::RefCell;
use std::rc::Rc;

/// Core that only counts frames and fills the screen
#[derive(Default)]
struct BenchCore {
    frame: u64,
}

impl Core for BenchCore {
    fn compile_program(&mut self, _source: &str) -> Result<(), CoreError> {
        Ok(())
    }

    fn will_run_program(&mut self, _seconds_since_power_on: u64) {}

    fn update(&mut self, input: &InputSnapshot, delegate: &mut dyn CoreDelegate) {
        self.frame += 1;
        if input.gamepads[0].button_a {
            delegate.persistent_ram_did_change(&[self.frame as u8]);
        }
    }

    fn render_screen(&self, buffer: &mut [u8], _stride: usize) {
        buffer.fill(self.frame as u8);
    }

    fn disk_import(&mut self, _text: &str) -> Result<(), CoreError> {
        Ok(())
    }

    fn disk_export(&self) -> Option<String> {
        None
    }

    fn disk_loaded(&mut self) {}

    fn exit_error(&self) -> Option<CoreError> {
        None
    }
}

#[derive(Default)]
struct BenchDelegate {
    saves: u64,
}

impl CoreDelegate for BenchDelegate {
    fn persistent_ram_did_change(&mut self, _data: &[u8]) {
        self.saves += 1;
    }
}

fn bench_runtime_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("runtime_update");

    group.bench_function("without_delegate", |b| {
        let mut runtime = Runtime::new(BenchCore::default());
        runtime.compile("").unwrap();
        let input = InputSnapshot::new();
        b.iter(|| {
            runtime.update(black_box(&input));
        });
    });

    group.bench_function("with_delegate_callback", |b| {
        let delegate = Rc::new(RefCell::new(BenchDelegate::default()));
        let mut runtime = Runtime::new(BenchCore::default());
        runtime.set_delegate(&delegate);
        runtime.compile("").unwrap();
        let mut input = InputSnapshot::new();
        input.press(0, nx_core::GamepadButton::A);
        b.iter(|| {
            runtime.update(black_box(&input));
        });
        black_box(delegate.borrow().saves);
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    c.bench_function("runtime_render_into", |b| {
        let mut runtime = Runtime::new(BenchCore::default());
        runtime.compile("").unwrap();
        let mut frame = Frame::new();
        b.iter(|| {
            runtime.render_into(&mut frame);
            black_box(frame.pixels[0]);
        });
    });
}

fn bench_locate_error(c: &mut Criterion) {
    let mut group = c.benchmark_group("source_line_locate");

    for lines in [100, 1000, 10000].iter() {
        let source: String = (0..*lines).map(|i| format!("PRINT {}\n", i)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(lines), &source, |b, source| {
            b.iter(|| black_box(SourceLine::locate(source, source.len() / 2)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_runtime_update, bench_render, bench_locate_error);
criterion_main!(benches);
