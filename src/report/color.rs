/// Styles of the parts of a report
#[derive(Copy, Clone, Debug, Default)]
pub struct Palette {
    pub(crate) info: anstyle::Style,
    pub(crate) warn: anstyle::Style,
    pub(crate) error: anstyle::Style,
    pub(crate) hint: anstyle::Style,
    pub(crate) command: anstyle::Style,
    pub(crate) expected: anstyle::Style,
    pub(crate) actual: anstyle::Style,
    pub(crate) whitespace: anstyle::Style,
}

impl Palette {
    pub fn always() -> Self {
        if cfg!(feature = "color") {
            Self {
                info: anstyle::AnsiColor::BrightBlue.on_default(),
                warn: anstyle::AnsiColor::Yellow.on_default(),
                error: anstyle::AnsiColor::Red.on_default() | anstyle::Effects::BOLD,
                hint: anstyle::AnsiColor::BrightBlack.on_default(),
                command: anstyle::AnsiColor::BrightYellow.on_default() | anstyle::Effects::BOLD,
                expected: anstyle::AnsiColor::Red.on_default() | anstyle::Effects::BOLD,
                actual: anstyle::AnsiColor::Green.on_default() | anstyle::Effects::BOLD,
                whitespace: anstyle::AnsiColor::Magenta.on_default() | anstyle::Effects::BOLD,
            }
        } else {
            Self::never()
        }
    }

    pub fn never() -> Self {
        Self::default()
    }

    pub fn auto() -> Self {
        if is_colored() {
            Self::always()
        } else {
            Self::never()
        }
    }

    pub fn info<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.info)
    }

    pub fn warn<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.warn)
    }

    pub fn error<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.error)
    }

    pub fn hint<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.hint)
    }

    pub fn command<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.command)
    }

    /// Expectations that were not met
    pub fn expected<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.expected)
    }

    /// Output that was not expected
    pub fn actual<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.actual)
    }

    pub fn whitespace<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.whitespace)
    }
}

fn is_colored() -> bool {
    #[cfg(feature = "color")]
    {
        anstream::AutoStream::choice(&std::io::stdout()) != anstream::ColorChoice::Never
    }
    #[cfg(not(feature = "color"))]
    {
        false
    }
}

#[derive(Debug)]
pub struct Styled<D> {
    display: D,
    style: anstyle::Style,
}

impl<D: std::fmt::Display> Styled<D> {
    pub(crate) fn new(display: D, style: anstyle::Style) -> Self {
        Self { display, style }
    }
}

impl<D: std::fmt::Display> std::fmt::Display for Styled<D> {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.style.render())?;
        self.display.fmt(f)?;
        write!(f, "{}", self.style.render_reset())?;
        Ok(())
    }
}
