//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::deliver::{deliver, failure_outcome, Source};
use super::types::{register_user, HandlerDeps, HandlerError, UserInfo};
use crate::conversation::{FlowContext, MenuButton, Outcome};
use crate::core::error::AppResult;
use crate::finance::period::Month;
use crate::telegram::bot::{start_payload, Command, RESET_ALL_COMMAND};
use crate::telegram::Bot;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same schema is used in production and in integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        // Hidden command (not in Command enum)
        .branch(reset_all_handler(deps.clone()))
        // `/start` carries an optional deep-link payload
        .branch(start_handler(deps.clone()))
        .branch(command_handler(deps.clone()))
        .branch(web_app_data_handler(deps.clone()))
        .branch(text_handler(deps.clone()))
        .branch(callback_handler(deps))
}

/// Runs `flow` for the sender of `msg` and delivers the result
async fn respond<F>(bot: &Bot, deps: &HandlerDeps, msg: &Message, flow: F)
where
    F: FnOnce(&FlowContext<'_>, &UserInfo) -> AppResult<Outcome>,
{
    let user = UserInfo::from_message(msg);
    register_user(&deps.db_pool, &user);

    let outcome = deps.run_flow(user.user_id, |ctx| flow(ctx, &user)).unwrap_or_else(|e| {
        log::error!("Flow failed for user {}: {}", user.user_id, e);
        failure_outcome()
    });

    let source = Source {
        chat_id: msg.chat.id,
        user_id: user.user_id,
        message_id: Some(msg.id),
    };
    deliver(bot, deps, source, outcome).await;
}

fn reset_all_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|text| text.trim() == RESET_ALL_COMMAND).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                respond(&bot, &deps, &msg, |ctx, _| ctx.reset_all()).await;
                Ok(())
            }
        })
}

fn start_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().and_then(start_payload).is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let payload = msg.text().and_then(start_payload).unwrap_or("").to_string();
                log::info!("/start from chat {} (payload: {})", msg.chat.id, !payload.is_empty());
                respond(&bot, &deps, &msg, |ctx, user| {
                    ctx.handle_start(user.first_name.as_deref(), &payload)
                })
                .await;
                Ok(())
            }
        })
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command {:?} from chat {}", cmd, msg.chat.id);
                respond(&bot, &deps, &msg, |ctx, user| match cmd {
                    // `start_handler` claims every `/start`; the variant exists for the command menu
                    Command::Start => ctx.handle_start(user.first_name.as_deref(), ""),
                    Command::Help => Ok(Outcome::reply(crate::conversation::views::help())),
                    Command::Balance => ctx.menu(MenuButton::Balance),
                    Command::History => ctx.menu(MenuButton::History),
                    Command::Report => Ok(Outcome::reply(ctx.report(Month::of(ctx.now))?)),
                    Command::Cancel => Ok(ctx.cancel()),
                })
                .await;
                Ok(())
            }
        },
    ))
}

fn web_app_data_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.web_app_data().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let data = msg.web_app_data().map(|d| d.data.clone()).unwrap_or_default();
                respond(&bot, &deps, &msg, |ctx, _| ctx.handle_web_app_data(&data)).await;
                Ok(())
            }
        })
}

fn text_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let text = msg.text().unwrap_or("").to_string();
                respond(&bot, &deps, &msg, |ctx, _| ctx.handle_text(&text)).await;
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let callback_id = q.id.clone();
            let data = q.data.clone().unwrap_or_default();
            let user_id = i64::try_from(q.from.id.0).unwrap_or_default();
            let chat_id = q.message.as_ref().map(|m| m.chat().id).unwrap_or(ChatId(user_id));
            let message_id = q.message.as_ref().map(|m| m.id());

            log::debug!("Callback '{}' from user {}", data, user_id);
            let mut outcome = deps.run_flow(user_id, |ctx| ctx.handle_callback(&data)).unwrap_or_else(|e| {
                log::error!("Callback '{}' failed for user {}: {}", data, user_id, e);
                failure_outcome()
            });

            let mut answer = bot.answer_callback_query(callback_id);
            if let Some(notice) = outcome.notice.take() {
                answer = answer.text(notice);
            }
            if let Err(e) = answer.await {
                log::warn!("Failed to answer callback query: {}", e);
            }

            let source = Source {
                chat_id,
                user_id,
                message_id,
            };
            deliver(&bot, &deps, source, outcome).await;
            Ok(())
        }
    })
}
