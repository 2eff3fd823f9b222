use std::collections::BTreeSet;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::question::Question;
use crate::models::quiz::{Answer, CorrectAnswer, QuizItem, QuizKind};
use crate::models::reward::{QuickLearnSummary, QuizOutcome, RewardSchedule, StarRating};
use crate::models::stock::{InvestStyle, RiskLevel, Stock};
use crate::services::quiz_service::QuizService;

/// Items in every quick-learn run.
pub const QUICK_LEARN_LENGTH: usize = 5;

const SECTOR_POOL: [&str; 6] = ["消费", "金融", "新能源", "科技", "医药", "制造"];

/// One quick-learn item: a single-choice question plus the knowledge card
/// shown after answering.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickLearnItem {
    pub quiz: QuizItem,
    pub knowledge: String,
}

/// Feedback shown right after an answer, right or wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickLearnFeedback {
    pub outcome: QuizOutcome,
    pub knowledge: String,
}

/// Where `next()` left the run.
#[derive(Debug, Clone, PartialEq)]
pub enum QuickLearnStep {
    Question(usize),
    Finished(QuickLearnSummary),
}

/// Short linear flow: five questions, immediate explanations, then a summary.
#[derive(Debug, Clone)]
pub struct QuickLearnSession {
    id: Uuid,
    stock: Stock,
    seed_question: Question,
    items: Vec<QuickLearnItem>,
    current: usize,
    answered_current: bool,
    attempted: usize,
    correct_count: usize,
    points: u32,
    knowledge_cards: Vec<String>,
}

impl QuickLearnSession {
    /// Build a run for `stock` around `seed_question`. The items are
    /// generated once here and never change.
    pub fn new(stock: Stock, seed_question: Question) -> Self {
        let items = generate_items(&stock, &seed_question);
        tracing::info!(stock_id = stock.id, question_id = seed_question.id, "quick learn started");
        Self {
            id: Uuid::new_v4(),
            stock,
            seed_question,
            items,
            current: 0,
            answered_current: false,
            attempted: 0,
            correct_count: 0,
            points: 0,
            knowledge_cards: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stock(&self) -> &Stock {
        &self.stock
    }

    pub fn seed_question(&self) -> &Question {
        &self.seed_question
    }

    pub fn items(&self) -> &[QuickLearnItem] {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&QuickLearnItem> {
        self.items.get(self.current)
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    /// Knowledge cards collected so far, one per answered item.
    pub fn knowledge_cards(&self) -> &[String] {
        &self.knowledge_cards
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.items.len()
    }

    /// Answer the current item. Each item takes exactly one answer.
    pub fn answer(&mut self, selected: usize) -> Result<QuickLearnFeedback, CoreError> {
        if self.is_finished() {
            return Err(CoreError::InvalidTransition {
                from: "a finished quick learn".into(),
                action: "answer".into(),
            });
        }
        if self.answered_current {
            return Err(CoreError::AlreadyAnswered);
        }
        let item = self
            .items
            .get(self.current)
            .ok_or_else(|| CoreError::MissingState("quick learn item".into()))?;
        let outcome =
            QuizService::new().grade(&item.quiz, &Answer::Choice(selected), RewardSchedule::QuickLearn)?;
        let knowledge = item.knowledge.clone();

        self.answered_current = true;
        self.attempted += 1;
        if outcome.correct {
            self.correct_count += 1;
        }
        self.points += outcome.points;
        self.knowledge_cards.push(knowledge.clone());

        Ok(QuickLearnFeedback { outcome, knowledge })
    }

    /// Move on. Past the last item the run is finished and summarized.
    /// Skipping an item without answering counts as not attempted.
    pub fn next(&mut self) -> Result<QuickLearnStep, CoreError> {
        if self.is_finished() {
            return Err(CoreError::InvalidTransition {
                from: "a finished quick learn".into(),
                action: "go forward".into(),
            });
        }
        self.current += 1;
        self.answered_current = false;
        if self.is_finished() {
            let summary = self.summary();
            tracing::info!(
                stock_id = self.stock.id,
                correct = summary.correct_count,
                stars = summary.stars.stars(),
                "quick learn finished"
            );
            Ok(QuickLearnStep::Finished(summary))
        } else {
            Ok(QuickLearnStep::Question(self.current))
        }
    }

    pub fn summary(&self) -> QuickLearnSummary {
        let total = self.items.len();
        let accuracy_pct = if total > 0 {
            self.correct_count as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        QuickLearnSummary {
            stock_id: self.stock.id,
            total,
            attempted: self.attempted,
            correct_count: self.correct_count,
            accuracy_pct,
            stars: StarRating::from_accuracy(accuracy_pct, self.attempted),
            points: self.points,
        }
    }
}

// ── Item generation ─────────────────────────────────────────────────

fn strings(options: &[&str]) -> Vec<String> {
    options.iter().map(|s| s.to_string()).collect()
}

/// Put `correct` among `distractors` at a position derived from `salt`,
/// so the right answer is not always first.
fn place(correct: &str, distractors: &[&str], salt: usize) -> (Vec<String>, usize) {
    let mut options = strings(distractors);
    let pos = salt % (options.len() + 1);
    options.insert(pos, correct.to_string());
    (options, pos)
}

fn generate_items(stock: &Stock, seed: &Question) -> Vec<QuickLearnItem> {
    let salt = stock.id.unsigned_abs() as usize;
    let mut items = Vec::with_capacity(QUICK_LEARN_LENGTH);

    // 1. Sector
    let sector = if stock.sector.is_empty() { "其他" } else { stock.sector.as_str() };
    let distractors: Vec<&str> = SECTOR_POOL
        .iter()
        .copied()
        .filter(|s| *s != sector)
        .take(3)
        .collect();
    let (options, correct) = place(sector, &distractors, salt);
    items.push(QuickLearnItem {
        quiz: QuizItem::single(
            "quick-1",
            format!("{}属于哪个板块?", stock.name),
            options,
            correct,
        )
        .with_explanation(format!("{}属于{sector}板块，细分行业是{}。", stock.name, stock.industry)),
        knowledge: "板块决定了公司所处的宏观周期和政策环境，是分析一家公司的第一步。".into(),
    });

    // 2. Style
    let style_options = strings(&["价值型", "成长型", "均衡型"]);
    let style_idx = match stock.style() {
        InvestStyle::Value => 0,
        InvestStyle::Growth => 1,
        InvestStyle::Balanced => 2,
    };
    items.push(QuickLearnItem {
        quiz: QuizItem::single(
            "quick-2",
            format!("{}更接近哪种投资风格?", stock.name),
            style_options.clone(),
            style_idx,
        )
        .with_explanation(format!("{}通常被视为{}标的。", stock.name, style_options[style_idx])),
        knowledge: "价值股看重当前盈利与估值折扣，成长股看重未来的收入和利润增速。".into(),
    });

    // 3. Risk
    let risk_options = strings(&["低风险", "中等风险", "高风险"]);
    let risk_idx = match stock.risk() {
        RiskLevel::Low => 0,
        RiskLevel::Medium => 1,
        RiskLevel::High => 2,
    };
    items.push(QuickLearnItem {
        quiz: QuizItem::single(
            "quick-3",
            format!("{}的波动风险大致处于什么水平?", stock.name),
            risk_options.clone(),
            risk_idx,
        )
        .with_explanation(format!("以行业特征看，{}属于{}。", stock.name, risk_options[risk_idx])),
        knowledge: "风险水平决定仓位大小：风险越高，单只股票的仓位越应克制。".into(),
    });

    // 4. Seed question: any sound research habit is accepted
    items.push(QuickLearnItem {
        quiz: QuizItem {
            id: "quick-4".into(),
            kind: QuizKind::Single,
            prompt: format!("围绕「{}」，下面哪种做法是可靠的研究方法?", seed.title),
            options: strings(&["阅读公司年报", "听信网上小道消息", "对比同行业财务指标", "只看最近几天的涨跌"]),
            correct: CorrectAnswer::AnyOf(BTreeSet::from([0, 2])),
            explanation: "年报和同行对比都基于公开、可验证的数据。".into(),
        },
        knowledge: format!("回答「{}」这类问题时，先找一手资料，再做横向比较。", seed.title),
    });

    // 5. Diversification
    items.push(QuickLearnItem {
        quiz: QuizItem {
            id: "quick-5".into(),
            kind: QuizKind::TrueFalse,
            prompt: format!("只持有{}一只股票，比分散持有多只股票风险更低。", stock.name),
            options: strings(&["正确", "错误"]),
            correct: CorrectAnswer::Index(1),
            explanation: "集中持有会放大单一公司的风险，分散投资可以降低非系统性风险。".into(),
        },
        knowledge: "分散投资无法消除市场整体风险，但能显著降低个股踩雷的影响。".into(),
    });

    items
}
