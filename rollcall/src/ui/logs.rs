use super::form;
use super::{Ctx, Transition, UiError};
use crate::util::TIME_FORMAT;

const SHOWN: usize = 50;

pub fn show(ctx: &mut Ctx<'_>) -> Result<Transition, UiError> {
    let messages = ctx.logger.recent(SHOWN);
    if messages.is_empty() {
        ctx.prompt.show("Nothing logged yet.");
    }

    for msg in messages {
        let time = msg.time.to_zoned(ctx.time_zone.clone());
        ctx.prompt.show(&format!(
            "{} {} {}",
            time.strftime(TIME_FORMAT),
            msg.styled_level(),
            msg.content
        ));
    }

    form::pause(ctx.prompt)?;
    Ok(Transition::Back)
}
