//! Pure task computation

use super::{Operation, Task, TaskError};

/// Apply `operation` to two operands
///
/// Division by an exactly-zero divisor fails with [`TaskError::DivisionByZero`];
/// any NaN or infinite outcome fails with [`TaskError::InvalidResult`].
pub fn apply(operation: Operation, arg1: f64, arg2: f64) -> Result<f64, TaskError> {
    let result = match operation {
        Operation::Add => arg1 + arg2,
        Operation::Subtract => arg1 - arg2,
        Operation::Multiply => arg1 * arg2,
        Operation::Divide => {
            if arg2 == 0.0 {
                return Err(TaskError::DivisionByZero);
            }
            arg1 / arg2
        }
    };

    if !result.is_finite() {
        return Err(TaskError::InvalidResult(result));
    }
    Ok(result)
}

/// Compute a task's value
pub fn process_task(task: &Task) -> Result<f64, TaskError> {
    apply(task.operation, task.arg1, task.arg2)
}
