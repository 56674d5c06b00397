/*!

# Quick start

This example runs a survey end to end from the command line: one respondent
answers, the submission is stored, then all the stored responses are summarized.

**Defining a survey** Write the definition to `survey.json` (see the
[manual](../manual/index.html) for the format). It asks for a score first and then
for a single choice:

```json
{
  "id": "s-1", "slug": "after-checkout", "active": true,
  "questions": [
    { "id": "nps", "title": "How likely are you to recommend us?", "type": "score", "order": 1 },
    { "id": "channel", "title": "Where did you buy?", "type": "choice", "order": 2,
      "options": [ { "id": "web", "label": "Website", "order": 1 },
                   { "id": "shop", "label": "Shop", "order": 2 } ] }
  ]
}
```

**Answering** Run the survey for the campaign `spring`:

```bash
npsurvey take --survey survey.json --campaign spring --out answer.json
```

Type `9`, then an empty line to move on: score questions wait for an explicit
step forward so that the score can still be changed. For the choice question,
type `web` or `1`. Choice questions move to the next step as soon as they are answered.
`:back` returns to the previous question and clears its answer. The review
step lists the answers; press enter or type `:submit`. `:quit` leaves without
writing anything.

```json
{
  "scoreAnswer": 9,
  "choiceAnswers": [ { "questionId": "channel", "optionId": "web" } ],
  "groupKeys": { "campaignId": "spring" }
}
```

**Summarizing** Once the storage layer has accumulated responses, export them
to `responses.json` and run:

```bash
npsurvey report --input responses.json --out stdout
```

```text
{
  "config": { "recentLimit": 5, "reportName": "responses", "utcOffsetMinutes": 0 },
  "results": {
    "overall": { "detractors": 1, "meanScore": 7.3, "netScorePercentage": 25, ... },
    "byCampaign": [ ... ],
    "byUnit": [ ... ],
    "byMonth": [ { "month": "2024-03", "label": "Mar 2024", ... } ],
    "recentResponses": [ ... ]
  }
}
```

Passing `--reference expected.json` compares the report with a previous one and
prints the differences. `--verbose` shows how the responses were processed.

*/
