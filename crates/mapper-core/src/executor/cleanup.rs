use chrono::Duration;

use super::{ExecutorContext, FlowMapperResult, MapperEventExecutor};
use crate::errors::MapperError;
use crate::model::FlowMapperStateType;

/// Pasa la sesión a `Closing` con `expiry = now + timeout`. El timer lo
/// programa el listener al ver el commit.
pub struct ScheduleCleanupExecutor<'a> {
    pub ctx: ExecutorContext<'a>,
    pub timeout_millis: u64,
}

impl MapperEventExecutor for ScheduleCleanupExecutor<'_> {
    fn execute(&self) -> Result<FlowMapperResult, MapperError> {
        let key = self.ctx.key;
        let state = self.ctx
                        .state
                        .ok_or_else(|| MapperError::unexpected(key, "ScheduleCleanup without session state"))?;

        if state.status == FlowMapperStateType::Closing {
            self.ctx.logger.debug(format_args!("schedule_cleanup key={key}: already closing, keeping expiry {:?}",
                                               state.expiry_time));
            return Ok(FlowMapperResult::unchanged(Some(state)));
        }

        let millis = i64::try_from(self.timeout_millis).map_err(|_| {
                         MapperError::unexpected(key, format!("cleanup timeout out of range: {}ms", self.timeout_millis))
                     })?;
        let expiry = self.ctx
                         .now
                         .checked_add_signed(Duration::milliseconds(millis))
                         .ok_or_else(|| MapperError::unexpected(key, "cleanup expiry overflows"))?;
        self.ctx.logger.debug(format_args!("schedule_cleanup key={key} expiry={expiry}"));
        Ok(FlowMapperResult::new(Some(state.closing(expiry)), vec![]))
    }
}

/// Borra el estado de la sesión. Idempotente: sobre un estado ausente no hace nada.
pub struct ExecuteCleanupExecutor<'a> {
    pub ctx: ExecutorContext<'a>,
}

impl MapperEventExecutor for ExecuteCleanupExecutor<'_> {
    fn execute(&self) -> Result<FlowMapperResult, MapperError> {
        match self.ctx.state {
            Some(state) => self.ctx.logger.debug(format_args!("execute_cleanup key={} status={:?}", self.ctx.key, state.status)),
            None => self.ctx.logger.debug(format_args!("execute_cleanup key={}: no state", self.ctx.key)),
        }
        Ok(FlowMapperResult::new(None, vec![]))
    }
}
