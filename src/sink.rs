use std::cell::RefCell;
use std::rc::Rc;

/// A text display the effects write into. Anything with a text and an
/// opacity will do; the core never looks further than this.
pub trait Sink {
    fn set_text(&mut self, text: &str);
    fn set_opacity(&mut self, opacity: f32);
}

#[derive(Debug, Clone)]
struct Buffer {
    text: String,
    opacity: f32,
    #[cfg(test)]
    writes: usize,
    #[cfg(test)]
    history: Vec<String>,
}

/// In-memory sink with shared read access. The host keeps one clone to
/// render from and hands the other to an effect.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    inner: Rc<RefCell<Buffer>>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::with_text("")
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Buffer {
                text: text.to_string(),
                opacity: 1.0,
                #[cfg(test)]
                writes: 0,
                #[cfg(test)]
                history: Vec::new(),
            })),
        }
    }

    pub fn text(&self) -> String {
        self.inner.borrow().text.clone()
    }

    pub fn opacity(&self) -> f32 {
        self.inner.borrow().opacity
    }

    /// Total `set_text` calls so far.
    #[cfg(test)]
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }

    /// Every distinct text the sink has shown, in order.
    #[cfg(test)]
    pub fn history(&self) -> Vec<String> {
        self.inner.borrow().history.clone()
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for TextBuffer {
    fn set_text(&mut self, text: &str) {
        let mut guard = self.inner.borrow_mut();
        let buf = &mut *guard;
        #[cfg(test)]
        {
            buf.writes += 1;
        }
        if buf.text != text {
            buf.text = text.to_string();
            #[cfg(test)]
            {
                buf.history.push(buf.text.clone());
            }
        }
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.inner.borrow_mut().opacity = opacity.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_contents() {
        let reader = TextBuffer::new();
        let mut writer: Box<dyn Sink> = Box::new(reader.clone());
        writer.set_text("abc");
        writer.set_opacity(2.0);
        assert_eq!(reader.text(), "abc");
        assert_eq!(reader.opacity(), 1.0);
        assert_eq!(reader.writes(), 1);
    }

    #[test]
    fn history_skips_repeated_text() {
        let mut buf = TextBuffer::new();
        buf.set_text("a");
        buf.set_text("a");
        buf.set_text("ab");
        assert_eq!(buf.history(), vec!["a", "ab"]);
        assert_eq!(buf.writes(), 3);
    }
}
