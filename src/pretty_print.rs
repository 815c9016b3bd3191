use std::fmt::{self, Debug, Display};

use faer::{Col, Mat};

use crate::Activation;

/// Displays a layer as `a_u = phi([W] a_{u-1} + [b])`, one matrix row per line.
pub struct PrettyPrintLayer {
    i_layer: usize,
    phi: Activation,
    w: Mat<f32>,
    b: Col<f32>,
}

impl PrettyPrintLayer {
    pub fn new(i_layer: usize, phi: Activation, w: Mat<f32>, b: Col<f32>) -> Self {
        debug_assert_eq!(w.nrows(), b.nrows());
        Self { i_layer, phi, w, b }
    }
}

impl Debug for PrettyPrintLayer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

fn n_digits(u: usize) -> usize {
    match u {
        0 => 1,
        u => ((u as f32).log10() + 1.0) as usize,
    }
}

fn write_element(f: &mut fmt::Formatter, element: f32) -> fmt::Result {
    if element.is_sign_positive() {
        write!(f, " {:.04?}", element)
    } else {
        write!(f, "{:.04?}", element)
    }
}

impl Display for PrettyPrintLayer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let n = self.w.nrows();
        let center_line = n / 2;
        let phi = self.phi.name();
        let i_layer = self.i_layer;
        let i_previous = i_layer.saturating_sub(1);
        let prefix_length = "a_ = (".len() + phi.len() + n_digits(i_layer);
        let infix_length = " a_ + ".len() + n_digits(i_previous);
        for i_line in 0..n {
            if i_line == center_line {
                write!(f, "a_{i_layer} = {phi}(")?;
            } else {
                write!(f, "{:prefix_length$}", "")?;
            }
            write!(f, "[")?;
            for g in 0..self.w.ncols() {
                if g != 0 {
                    write!(f, " ")?;
                }
                write_element(f, self.w[(i_line, g)])?;
            }
            write!(f, "]")?;
            if i_line == center_line {
                write!(f, " a_{i_previous} + ")?;
            } else {
                write!(f, "{:infix_length$}", "")?;
            }
            write!(f, "[")?;
            write_element(f, self.b[i_line])?;
            write!(f, "]")?;
            if i_line == center_line {
                write!(f, ")")?;
            }
            if i_line != n - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_matrix_equation() {
        let w = Mat::from_fn(3, 2, |k, g| (k * 2 + g) as f32 * 0.5 - 1.0);
        let b = Col::from_fn(3, |k| k as f32 * 0.25);
        let printed = PrettyPrintLayer::new(1, Activation::Tanh, w, b).to_string();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "a_1 = tanh([ 0.0000  0.5000] a_0 + [ 0.2500])");
        let expected = format!("{}[-1.0000 -0.5000]{}[ 0.0000]", " ".repeat(11), " ".repeat(7));
        assert_eq!(lines[0], expected);
        assert!(lines.iter().all(|line| line.find('[') == lines[1].find('[')));
    }
}
