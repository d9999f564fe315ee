//! Shared output sink.
//!
//! Synchronous replies (command thread) and asynchronous notifications
//! (engine callback thread) interleave on the same stream; the mutex around
//! the writer guarantees each protocol line reaches it whole.

use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Printer {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Printer {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Printer {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Printer::new(io::stdout())
    }

    /// Write one protocol line atomically.
    pub fn line(&self, text: impl Display) {
        let mut out = self.out.lock().expect("output sink poisoned");
        if writeln!(out, "{text}").is_err() {
            return;
        }
        _ = out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Clone, Default)]
    pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        pub fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_concurrent_writers_never_tear_lines() {
        let buf = SharedBuf::default();
        let printer = Printer::new(buf.clone());

        let workers: Vec<_> = (0..4)
            .map(|w| {
                let printer = printer.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        printer.line(format!("worker-{w}-line-{i}-end"));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let output = buf.contents();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 1000);
        for line in lines {
            assert!(line.starts_with("worker-"), "torn line: {line}");
            assert!(line.ends_with("-end"), "torn line: {line}");
        }
    }
}
